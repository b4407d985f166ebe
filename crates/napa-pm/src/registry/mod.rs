//! Registry access: what versions exist, and what a version needs.

mod http;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::Result;

pub use http::HttpRegistryClient;

/// Package-level registry metadata: the published versions and dist tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub versions: Vec<String>,
    pub latest: Option<String>,
}

/// Version-level registry metadata: the dependency specs and the download
/// coordinates of one published version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMetadata {
    pub dependencies: IndexMap<String, String>,
    pub tarball: String,
    pub shasum: String,
}

/// A source of package metadata.
///
/// Constructed explicitly and passed into the resolver and the commands;
/// tests substitute an in-memory fake.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Versions and dist tags published for `name`.
    async fn metadata(&self, name: &str) -> Result<PackageMetadata>;

    /// Dependencies and download coordinates of `name@version`.
    async fn version_metadata(&self, name: &str, version: &str) -> Result<VersionMetadata>;

    /// The version the registry tags as latest, if any.
    async fn latest_version(&self, name: &str) -> Result<Option<String>> {
        Ok(self.metadata(name).await?.latest)
    }
}
