//! Input filtering and output naming.
//!
//! The output file keeps the input's stem and extension, with a suffix in
//! between, so the container (and therefore the encoder) never changes:
//! - `IMG_0001.jpg` → `IMG_0001_padded.jpg`
//! - `scan.TIFF` → `scan_padded.TIFF`
//! - `archive.v2.png` → `archive.v2_padded.png`

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};

/// Whether the file extension is one we can decode and re-encode.
/// Case-insensitive.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Output path for `input` inside `output_dir`.
///
/// Returns `None` when `input` has no file stem (e.g. `..`).
pub fn output_path_for(input: &Path, output_dir: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    Some(output_dir.join(name))
}
