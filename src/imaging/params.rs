//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the batch driver (which decides what to pad and where
//! to write it), the [`compositor`](super::compositor) (which builds the
//! canvas) and the [`backend`](super::backend) (which does the codec work).
//!
//! ## Types
//!
//! - [`Padding`]: Ratio padding to an [`AspectRatio`], or `Even` for none.
//! - [`BackgroundColor`]: RGB fill for padding and border, parsed from `#rrggbb`.
//! - [`ComposeParams`]: Everything the compositor needs for one image.
//! - [`OutputFormat`]: Container picked from the output extension, with the
//!   print-ready encoder policy attached.

use super::calculations::AspectRatio;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How the first compositing stage pads the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    /// Pad to the minimal canvas with this ratio.
    Ratio(AspectRatio),
    /// Keep the image size; only the optional border is added.
    Even,
}

/// Fill color for the padding and border canvases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundColor(pub [u8; 3]);

impl BackgroundColor {
    pub const WHITE: Self = Self([255, 255, 255]);

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }

    pub fn rgba(self) -> [u8; 4] {
        let [r, g, b] = self.0;
        [r, g, b, 255]
    }

    /// Gray level for single-channel canvases (ITU-R 601-2 luma).
    pub fn luma(self) -> u8 {
        let [r, g, b] = self.0.map(u32::from);
        ((r * 299 + g * 587 + b * 114) / 1000) as u8
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for BackgroundColor {
    type Err = String;

    /// Parse `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{s}': expected #rrggbb"));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self([r, g, b])),
            _ => Err(format!("invalid color '{s}': expected #rrggbb")),
        }
    }
}

/// Parameters for composing one padded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeParams {
    pub padding: Padding,
    /// Outer border as a fraction of the padded canvas (`0.1` = 10%).
    pub border: f64,
    pub background: BackgroundColor,
}

/// Output container, decided entirely by the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Tiff,
    WebP,
}

/// Encoder quality forced for lossy containers.
///
/// Print-ready output never trades quality for size.
pub const PRINT_QUALITY: u8 = 100;

impl OutputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Whether an EXIF block can be embedded. Every output format carries
    /// the ICC profile; TIFF is the one that cannot take EXIF.
    pub fn carries_exif(self) -> bool {
        !matches!(self, Self::Tiff)
    }

    /// Whether the container has a pixel-density field.
    pub fn carries_dpi(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Tiff => "TIFF",
            Self::WebP => "WebP",
        };
        f.write_str(name)
    }
}
