//! Shared test utilities for the print-pad test suite.
//!
//! Synthetic rasters and files generated with the `image` crate, plus small
//! metadata payloads that are structurally valid enough for every container
//! to carry them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("a.jpg"), 300, 200);
//! let icc = sample_icc();
//! ```

use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::io::BufWriter;
use std::path::Path;

// =========================================================================
// Rasters
// =========================================================================

/// RGB image whose pixels encode their own coordinates.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

// =========================================================================
// Files
// =========================================================================

/// Write a small valid JPEG with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient_rgb(width, height);
    let writer = BufWriter::new(std::fs::File::create(path).unwrap());
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient_rgb(width, height);
    let writer = BufWriter::new(std::fs::File::create(path).unwrap());
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Metadata payloads
// =========================================================================

/// An ICC-shaped blob: 132 bytes, big-endian size in the header, `acsp`
/// signature at offset 36. Decoders pass it through without interpreting it.
pub fn sample_icc() -> Vec<u8> {
    let mut icc = vec![0u8; 132];
    icc[0..4].copy_from_slice(&132u32.to_be_bytes());
    icc[4..8].copy_from_slice(b"test");
    icc[8] = 4;
    icc[12..16].copy_from_slice(b"mntr");
    icc[16..20].copy_from_slice(b"RGB ");
    icc[20..24].copy_from_slice(b"XYZ ");
    icc[36..40].copy_from_slice(b"acsp");
    icc
}

/// A minimal little-endian EXIF TIFF payload with one Make entry.
pub fn sample_exif() -> Vec<u8> {
    let mut exif = Vec::new();
    exif.extend_from_slice(b"II*\0");
    exif.extend_from_slice(&8u32.to_le_bytes());
    // IFD0: one ASCII entry, value inline ("PP\0" fits in four bytes)
    exif.extend_from_slice(&1u16.to_le_bytes());
    exif.extend_from_slice(&0x010Fu16.to_le_bytes());
    exif.extend_from_slice(&2u16.to_le_bytes());
    exif.extend_from_slice(&3u32.to_le_bytes());
    exif.extend_from_slice(b"PP\0\0");
    exif.extend_from_slice(&0u32.to_le_bytes());
    exif
}
