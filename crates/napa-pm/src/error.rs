use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NapaError {
    // Resolution errors
    #[error("no version of {name} satisfies '{range}'")]
    NoSatisfyingVersion { name: String, range: String },

    #[error("failed to fetch metadata for {name}: {reason}")]
    MetadataFetch { name: String, reason: String },

    // Download errors
    #[error("download failed for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("checksum mismatch for {}: expected {}, got {}", .path.display(), .expected, .actual)]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // Extraction errors
    #[error("extraction failed: {0}")]
    Extraction(String),

    // Manifest errors
    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NapaError>;
