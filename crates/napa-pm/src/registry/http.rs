//! npm-registry HTTP client.
//!
//! Speaks the two metadata endpoints the pipeline needs:
//! `GET {base}/{name}` (the packument) and `GET {base}/{name}/{version}`.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{NapaError, Result};
use crate::http::HttpClient;

use super::{PackageMetadata, RegistryClient, VersionMetadata};

/// Wire shape of a packument. `versions` is an object keyed by version
/// string; we only need its keys.
#[derive(Debug, Deserialize)]
struct PackumentDoc {
    #[serde(default)]
    versions: IndexMap<String, serde_json::Value>,

    #[serde(default, rename = "dist-tags")]
    dist_tags: IndexMap<String, String>,

    // The registry reports "Not found" in-body with a 200 on some mirrors
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionDoc {
    #[serde(default)]
    dependencies: IndexMap<String, String>,

    dist: DistDoc,

    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DistDoc {
    tarball: String,
    #[serde(default)]
    shasum: String,
}

pub struct HttpRegistryClient {
    http: Arc<HttpClient>,
    base_url: String,
}

impl HttpRegistryClient {
    pub fn new(http: Arc<HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, encode_name(name))
    }

    fn version_url(&self, name: &str, version: &str) -> String {
        format!("{}/{}/{}", self.base_url, encode_name(name), version)
    }

    fn fetch_error(name: &str, reason: impl ToString) -> NapaError {
        NapaError::MetadataFetch {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Escape a package name for use as a URL path segment. Scoped names keep
/// their leading `@` but have the scope separator encoded.
fn encode_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(rest) => format!("@{}", urlencoding::encode(rest)),
        None => urlencoding::encode(name).into_owned(),
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn metadata(&self, name: &str) -> Result<PackageMetadata> {
        let doc: PackumentDoc = self
            .http
            .get_json(&self.package_url(name))
            .await
            .map_err(|e| Self::fetch_error(name, e))?;

        if let Some(error) = doc.error {
            return Err(Self::fetch_error(name, error));
        }

        Ok(PackageMetadata {
            versions: doc.versions.keys().cloned().collect(),
            latest: doc.dist_tags.get("latest").cloned(),
        })
    }

    async fn version_metadata(&self, name: &str, version: &str) -> Result<VersionMetadata> {
        let doc: VersionDoc = self
            .http
            .get_json(&self.version_url(name, version))
            .await
            .map_err(|e| Self::fetch_error(name, e))?;

        if let Some(error) = doc.error {
            return Err(Self::fetch_error(name, error));
        }

        Ok(VersionMetadata {
            dependencies: doc.dependencies,
            tarball: doc.dist.tarball,
            shasum: doc.dist.shasum,
        })
    }
}
