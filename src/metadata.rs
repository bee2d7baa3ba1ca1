//! Embedded metadata carried from source to output.
//!
//! Three pieces of metadata matter for printing:
//!
//! - **ICC profile**: how the pixel values map to real colors. Dropping it
//!   makes a print lab guess the color space, so it is **always** kept.
//! - **EXIF block**: camera, lens, capture date, copyright. Kept only when the
//!   user asks for it.
//! - **DPI**: the physical print density. Kept only when the user asks for it,
//!   together with EXIF.
//!
//! ## Lifetime
//!
//! The bundle is captured once when the source is decoded and attached once
//! when the output is encoded. Between the two it is only filtered by
//! [`MetadataBundle::for_save`], which returns a new bundle.
//!
//! The EXIF block is stored as the raw TIFF payload, without the JPEG
//! `Exif\0\0` prefix, so it moves between JPEG, PNG and WebP unchanged.

use std::fmt;

/// Print density in dots per inch, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dpi {
    pub x: f64,
    pub y: f64,
}

impl Dpi {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both axes finite and positive.
    pub fn is_valid(self) -> bool {
        [self.x, self.y].iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

impl fmt::Display for Dpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.x == self.y {
            write!(f, "{} dpi", self.x.round())
        } else {
            write!(f, "{}x{} dpi", self.x.round(), self.y.round())
        }
    }
}

/// Metadata read from a source image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBundle {
    pub icc_profile: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
    pub dpi: Option<Dpi>,
}

impl MetadataBundle {
    /// The subset to embed in the output.
    ///
    /// The ICC profile is always kept. EXIF and DPI are kept only when
    /// `preserve_extra` is set.
    pub fn for_save(&self, preserve_extra: bool) -> Self {
        Self {
            icc_profile: self.icc_profile.clone(),
            exif: self.exif.clone().filter(|_| preserve_extra),
            dpi: self.dpi.filter(|_| preserve_extra),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.icc_profile.is_none() && self.exif.is_none() && self.dpi.is_none()
    }

    /// Short human-readable list of what the bundle holds (`ICC, EXIF, 300 dpi`).
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.icc_profile.is_some() {
            parts.push("ICC".to_string());
        }
        if self.exif.is_some() {
            parts.push("EXIF".to_string());
        }
        if let Some(dpi) = self.dpi {
            parts.push(dpi.to_string());
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}
