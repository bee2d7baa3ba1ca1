//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the decode/encode boundary. It has three
//! operations:
//!
//! - **identify**: read dimensions without decoding pixels (used by `check`).
//! - **load**: decode pixels and capture the [`MetadataBundle`].
//! - **save**: encode a raster into the container picked by the output
//!   extension and attach the given metadata.
//!
//! Everything above the backend (compositing, batch driving) works with
//! in-memory rasters and never touches a codec. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend).

use super::calculations::ImageSize;
use crate::metadata::MetadataBundle;
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// A decoded source image together with the metadata found next to it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    pub metadata: MetadataBundle,
}

/// Trait for image backends.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<ImageSize, BackendError>;

    /// Decode pixels and capture ICC, EXIF and DPI.
    fn load(&self, path: &Path) -> Result<SourceImage, BackendError>;

    /// Encode `raster` to `path`, embedding `metadata` where the container
    /// allows it. The caller has already applied the save policy.
    fn save(
        &self,
        raster: &DynamicImage,
        metadata: &MetadataBundle,
        path: &Path,
    ) -> Result<(), BackendError>;
}
