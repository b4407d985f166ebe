//! Core package data model: identifiers, specs, and resolved coordinates.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Fully-qualified package id: `name@version`.
///
/// The version part is empty for a bare name. Scoped names keep their
/// leading `@`; the separator is the *last* `@` in the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name@version` (`@babel/helper@10.3.4` splits on the last `@`).
    pub fn parse(input: &str) -> Self {
        match input.rfind('@') {
            Some(pos) => Self {
                name: input[..pos].to_string(),
                version: input[pos + 1..].to_string(),
            },
            None => Self {
                name: input.to_string(),
                version: String::new(),
            },
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A dependency as declared: a name plus a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub range: String,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: range.into(),
        }
    }
}

/// A concrete package pinned to one version, with download coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub download_url: String,
    pub shasum: String,
}

impl ResolvedPackage {
    pub fn id(&self) -> PackageId {
        PackageId::new(&self.name, &self.version)
    }

    pub fn fqpid(&self) -> String {
        self.id().to_string()
    }
}

/// The deduplicated result of a resolution run, keyed by FQPID.
///
/// Once a key is present it is never overwritten; iteration order is the
/// order packages were first discovered.
pub type ResolutionSet = IndexMap<String, ResolvedPackage>;

/// Where one resolved package lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    pub fqpid: String,
    pub output_dir: PathBuf,
    pub archive_path: PathBuf,
}

impl InstallTarget {
    /// Derive the on-disk target for a package under `install_root`.
    ///
    /// The tree is flat: one directory per package *name*, so a later
    /// package with the same name lands in the same directory.
    pub fn for_package(package: &ResolvedPackage, install_root: &Path) -> Self {
        let output_dir = install_root.join(&package.name);
        let archive_path = output_dir.join(archive_filename(&package.download_url));
        Self {
            fqpid: package.fqpid(),
            output_dir,
            archive_path,
        }
    }
}

/// Final path segment of a download URL, used as the local archive name.
fn archive_filename(download_url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(download_url) {
        if let Some(segments) = parsed.path_segments() {
            if let Some(last) = segments.filter(|s| !s.is_empty()).last() {
                return last.to_string();
            }
        }
    }
    "package.tgz".to_string()
}
