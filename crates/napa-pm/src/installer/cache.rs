//! Install cache inspection.

use std::path::Path;

use crate::config::MANIFEST_FILE;

/// Whether a package is already fully installed in `output_dir`.
///
/// The marker is the unpacked package's own `package.json`: a directory
/// that exists but lacks it (partial extraction, manual deletion) reads as
/// not installed. Recomputed on every call, never cached.
pub fn is_installed(output_dir: &Path) -> bool {
    output_dir.join(MANIFEST_FILE).is_file()
}
