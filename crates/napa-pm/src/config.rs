//! Runtime configuration for the package manager.

use std::path::{Path, PathBuf};

/// Default public registry origin, used when no override is configured.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Environment variable that overrides the registry endpoint.
pub const REGISTRY_ENV_VAR: &str = "NAPA_REGISTRY";

/// Directory packages are unpacked into, one subdirectory per package name.
pub const INSTALL_DIR: &str = "node_modules";

/// The project manifest file, and also the descriptor every unpacked
/// package carries (which is what the cache check looks for).
pub const MANIFEST_FILE: &str = "package.json";

/// Default bound on concurrent registry requests and downloads.
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct Config {
    /// Registry base endpoint, without a trailing slash.
    pub registry_url: String,
    /// Path to the project manifest.
    pub manifest_path: PathBuf,
    /// Root of the install tree.
    pub install_root: PathBuf,
    /// Maximum in-flight registry requests / downloads.
    pub concurrency: usize,
}

impl Config {
    /// Build a configuration rooted at `working_dir`, honoring the
    /// `NAPA_REGISTRY` environment override.
    pub fn for_working_dir(working_dir: &Path) -> Self {
        let registry_url = std::env::var(REGISTRY_ENV_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        Self {
            registry_url: registry_url.trim_end_matches('/').to_string(),
            manifest_path: working_dir.join(MANIFEST_FILE),
            install_root: working_dir.join(INSTALL_DIR),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.registry_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::for_working_dir(Path::new("/tmp/project"));
        assert!(config.manifest_path.ends_with("package.json"));
        assert!(config.install_root.ends_with("node_modules"));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_registry_url_trailing_slash_stripped() {
        let config = Config::for_working_dir(Path::new("."))
            .with_registry_url("https://registry.example.org/");
        assert_eq!(config.registry_url, "https://registry.example.org");
    }

    #[test]
    fn test_concurrency_floor() {
        let config = Config::for_working_dir(Path::new(".")).with_concurrency(0);
        assert_eq!(config.concurrency, 1);
    }
}
