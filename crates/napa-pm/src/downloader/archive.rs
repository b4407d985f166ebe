//! Gzipped tarball extraction.
//!
//! Registry tarballs nest their contents under a single `package/`
//! directory, so extraction strips the first path component: the package's
//! own `package.json` ends up directly in the output directory, which is
//! exactly what the install cache checks for.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{NapaError, Result};

/// Unpack a `.tgz` archive into `output_dir`, creating it if absent.
///
/// Safe to call into an existing non-empty directory.
pub fn extract(archive_path: &Path, output_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    extract_tar_with_strip(decoder, output_dir, 1)
}

/// Extract a tar stream with leading path components stripped.
pub fn extract_tar_with_strip<R: Read>(
    reader: R,
    output_dir: &Path,
    strip_components: usize,
) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    std::fs::create_dir_all(output_dir)?;

    // Canonicalize for the path traversal check below
    let output_dir_canonical = output_dir.canonicalize().map_err(|e| {
        NapaError::Extraction(format!("failed to canonicalize destination: {e}"))
    })?;

    for entry in archive
        .entries()
        .map_err(|e| NapaError::Extraction(format!("failed to read tar: {e}")))?
    {
        let mut entry =
            entry.map_err(|e| NapaError::Extraction(format!("failed to read tar entry: {e}")))?;

        let path = entry
            .path()
            .map_err(|e| NapaError::Extraction(format!("invalid path in tar: {e}")))?;

        let components: Vec<_> = path.components().collect();
        if components.len() <= strip_components {
            continue;
        }

        let stripped: std::path::PathBuf = components[strip_components..].iter().collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let stripped_str = stripped.to_string_lossy();
        if stripped_str.contains("..") {
            return Err(NapaError::Extraction(format!(
                "path traversal detected in archive: {stripped_str}"
            )));
        }

        let outpath = output_dir.join(&stripped);

        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Verify the entry stays within the destination directory
        let outpath_canonical = outpath.canonicalize().unwrap_or_else(|_| {
            if let Some(parent) = outpath.parent() {
                if let Ok(parent_canonical) = parent.canonicalize() {
                    if let Some(filename) = outpath.file_name() {
                        return parent_canonical.join(filename);
                    }
                }
            }
            outpath.clone()
        });

        if !outpath_canonical.starts_with(&output_dir_canonical) {
            return Err(NapaError::Extraction(format!(
                "path traversal detected: {stripped_str} escapes destination directory"
            )));
        }

        if !entry.header().entry_type().is_dir() {
            entry
                .unpack(&outpath)
                .map_err(|e| NapaError::Extraction(format!("failed to extract: {e}")))?;
        }
    }

    Ok(())
}
