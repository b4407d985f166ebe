//! Version selection: pick the best published version for a range.

use semver::{Version, VersionReq};

use crate::error::{NapaError, Result};
use crate::package::PackageId;

/// Strip a registry-alias prefix from a range.
///
/// A range written as `npm:real-name@^1.0` redirects the lookup to
/// `real-name` with range `^1.0`; a plain range passes through with the
/// name unchanged. This is pure normalization, not version matching.
pub fn normalize_spec(name: &str, range: &str) -> (String, String) {
    if let Some(aliased) = range.strip_prefix("npm:") {
        let id = PackageId::parse(aliased);
        if !id.name.is_empty() {
            let range = if id.version.is_empty() {
                "*".to_string()
            } else {
                id.version
            };
            return (id.name, range);
        }
    }

    (name.to_string(), range.to_string())
}

/// Select the highest version in `available` satisfying `range`.
///
/// Unparseable candidates are skipped rather than failing the lookup;
/// registries do publish the occasional non-semver tag.
pub fn select_version(name: &str, range: &str, available: &[String]) -> Result<String> {
    let no_match = || NapaError::NoSatisfyingVersion {
        name: name.to_string(),
        range: range.to_string(),
    };

    let req = parse_range(range).ok_or_else(no_match)?;

    available
        .iter()
        .filter_map(|raw| Version::parse(raw.trim().trim_start_matches('v')).ok())
        .filter(|candidate| req.matches(candidate))
        .max()
        .map(|best| best.to_string())
        .ok_or_else(no_match)
}

/// Parse an npm-style range into a `VersionReq`.
///
/// A bare version is an exact pin in npm, while `VersionReq` would read it
/// as a caret range, so pin it explicitly.
fn parse_range(range: &str) -> Option<VersionReq> {
    let trimmed = range.trim();

    if trimmed.is_empty() || trimmed == "*" || trimmed == "latest" {
        return Some(VersionReq::STAR);
    }

    if let Ok(exact) = Version::parse(trimmed.trim_start_matches('v')) {
        return VersionReq::parse(&format!("={exact}")).ok();
    }

    VersionReq::parse(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn available() -> Vec<String> {
        ["1.2.0", "1.2.5", "1.9.0", "2.0.0"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_caret_selects_highest_within_major() {
        let version = select_version("pkg", "^1.2.0", &available()).unwrap();
        assert_eq!(version, "1.9.0");
    }

    #[test]
    fn test_tilde_selects_highest_within_minor() {
        let version = select_version("pkg", "~1.2.0", &available()).unwrap();
        assert_eq!(version, "1.2.5");
    }

    #[test]
    fn test_exact_pin() {
        let version = select_version("pkg", "1.2.0", &available()).unwrap();
        assert_eq!(version, "1.2.0");
    }

    #[test]
    fn test_no_satisfying_version() {
        let result = select_version("pkg", "^5.0.0", &available());
        assert!(matches!(
            result,
            Err(NapaError::NoSatisfyingVersion { name, range })
                if name == "pkg" && range == "^5.0.0"
        ));
    }

    #[test]
    fn test_star_and_empty_match_everything() {
        assert_eq!(select_version("pkg", "*", &available()).unwrap(), "2.0.0");
        assert_eq!(select_version("pkg", "", &available()).unwrap(), "2.0.0");
        assert_eq!(
            select_version("pkg", "latest", &available()).unwrap(),
            "2.0.0"
        );
    }

    #[test]
    fn test_unparseable_candidates_are_skipped() {
        let versions = vec![
            "not-a-version".to_string(),
            "1.2.0".to_string(),
            "1.4.0".to_string(),
        ];
        assert_eq!(select_version("pkg", "^1.0.0", &versions).unwrap(), "1.4.0");
    }

    #[test]
    fn test_v_prefixed_candidates() {
        let versions = vec!["v1.2.0".to_string(), "v1.3.0".to_string()];
        assert_eq!(select_version("pkg", "^1.2.0", &versions).unwrap(), "1.3.0");
    }

    #[test]
    fn test_empty_availability_fails() {
        let result = select_version("pkg", "^1.0.0", &[]);
        assert!(matches!(result, Err(NapaError::NoSatisfyingVersion { .. })));
    }

    #[test]
    fn test_normalize_alias() {
        let (name, range) = normalize_spec("wrap-ansi-cjs", "npm:wrap-ansi@^7.0.0");
        assert_eq!(name, "wrap-ansi");
        assert_eq!(range, "^7.0.0");
    }

    #[test]
    fn test_normalize_scoped_alias() {
        let (name, range) = normalize_spec("helper", "npm:@babel/helper@^10.0.0");
        assert_eq!(name, "@babel/helper");
        assert_eq!(range, "^10.0.0");
    }

    #[test]
    fn test_normalize_alias_without_range() {
        let (name, range) = normalize_spec("alias", "npm:wrap-ansi");
        assert_eq!(name, "wrap-ansi");
        assert_eq!(range, "*");
    }

    #[test]
    fn test_normalize_plain_range_passes_through() {
        let (name, range) = normalize_spec("wrap-ansi", "^7.0.0");
        assert_eq!(name, "wrap-ansi");
        assert_eq!(range, "^7.0.0");
    }
}
