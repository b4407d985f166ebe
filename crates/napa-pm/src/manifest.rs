//! The project manifest: a `package.json` with a `dependencies` mapping.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{NapaError, Result};

/// Name → version-range mapping declared by a manifest.
pub type DependencyMap = IndexMap<String, String>;

/// Read/write access to the project's dependency declarations.
///
/// Injected into the commands rather than reached through a global, so
/// tests can substitute an in-memory implementation.
pub trait ManifestStore: Send + Sync {
    /// The declared dependencies. A missing manifest is an empty mapping,
    /// not an error; a present-but-invalid one is.
    fn read(&self) -> Result<DependencyMap>;

    /// Persist the dependency mapping, preserving unrelated manifest fields.
    fn write(&self, dependencies: &DependencyMap) -> Result<()>;
}

/// The subset of `package.json` we care about. Unknown fields are kept
/// as-is so a rewrite does not drop them.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ManifestDoc {
    #[serde(default)]
    dependencies: DependencyMap,

    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

/// File-backed manifest store.
pub struct FileManifestStore {
    path: PathBuf,
}

impl FileManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_doc(&self) -> Result<ManifestDoc> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            // No manifest yet: start fresh
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ManifestDoc::default())
            }
            Err(err) => return Err(NapaError::Io(err)),
        };

        let doc: ManifestDoc = serde_json::from_str(&content)?;
        Ok(doc)
    }
}

impl ManifestStore for FileManifestStore {
    fn read(&self) -> Result<DependencyMap> {
        Ok(self.load_doc()?.dependencies)
    }

    fn write(&self, dependencies: &DependencyMap) -> Result<()> {
        let mut doc = self.load_doc()?;
        doc.dependencies = dependencies.clone();

        let mut content = serde_json::to_string_pretty(&doc)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
