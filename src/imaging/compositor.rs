//! Two-stage padding composition.
//!
//! ```text
//! source ──▶ stage 1: ratio canvas ──▶ stage 2: border canvas ──▶ raster
//!            (or same size in even mode)  (only when border > 0)
//! ```
//!
//! Each stage allocates a fresh [`Canvas`] filled with the background color
//! and copies the previous layer into its center. Pixels are copied, never
//! blended or resampled, so the source appears bit-identical in the output.
//!
//! ## Pixel modes
//!
//! Canvases exist in three layouts only: RGB8, RGBA8 and Luma8. Any other
//! decoded layout (gray+alpha, 16-bit, float) is converted to RGB8 before
//! padding. That conversion is lossy for alpha and high bit depth; it is
//! logged at `warn` and reported in [`Composition::coerced_from`], never
//! raised as an error.

use super::calculations::{ImageSize, bordered_size, center_offset, compute_canvas_size};
use super::params::{BackgroundColor, ComposeParams, Padding};
use image::{
    ColorType, DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, Rgba, RgbaImage,
    imageops,
};
use tracing::{debug, warn};

/// Pixel layout of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    Rgb8,
    Rgba8,
    Luma8,
}

impl std::fmt::Display for PixelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Rgb8 => "RGB",
            Self::Rgba8 => "RGBA",
            Self::Luma8 => "L",
        };
        f.write_str(name)
    }
}

/// A raster in one of the supported [`PixelMode`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Canvas {
    Rgb8(RgbImage),
    Rgba8(RgbaImage),
    Luma8(GrayImage),
}

impl Canvas {
    /// Take ownership of a decoded image, converting unsupported layouts to RGB8.
    ///
    /// Returns the original color type when a conversion happened.
    pub fn from_image(image: DynamicImage) -> (Self, Option<ColorType>) {
        match image {
            DynamicImage::ImageRgb8(buf) => (Self::Rgb8(buf), None),
            DynamicImage::ImageRgba8(buf) => (Self::Rgba8(buf), None),
            DynamicImage::ImageLuma8(buf) => (Self::Luma8(buf), None),
            other => {
                let color = other.color();
                (Self::Rgb8(other.into_rgb8()), Some(color))
            }
        }
    }

    pub fn mode(&self) -> PixelMode {
        match self {
            Self::Rgb8(_) => PixelMode::Rgb8,
            Self::Rgba8(_) => PixelMode::Rgba8,
            Self::Luma8(_) => PixelMode::Luma8,
        }
    }

    pub fn size(&self) -> ImageSize {
        let (width, height) = match self {
            Self::Rgb8(buf) => buf.dimensions(),
            Self::Rgba8(buf) => buf.dimensions(),
            Self::Luma8(buf) => buf.dimensions(),
        };
        ImageSize { width, height }
    }

    /// Allocate a new canvas of `size` in the same mode, filled with
    /// `background`, with this canvas copied into its center.
    pub fn pad_to(&self, size: ImageSize, background: BackgroundColor) -> Self {
        match self {
            Self::Rgb8(buf) => Self::Rgb8(pad_buffer(buf, size, Rgb(background.rgb()))),
            Self::Rgba8(buf) => Self::Rgba8(pad_buffer(buf, size, Rgba(background.rgba()))),
            Self::Luma8(buf) => Self::Luma8(pad_buffer(buf, size, Luma([background.luma()]))),
        }
    }

    pub fn into_image(self) -> DynamicImage {
        match self {
            Self::Rgb8(buf) => DynamicImage::ImageRgb8(buf),
            Self::Rgba8(buf) => DynamicImage::ImageRgba8(buf),
            Self::Luma8(buf) => DynamicImage::ImageLuma8(buf),
        }
    }
}

fn pad_buffer<P: Pixel>(
    source: &ImageBuffer<P, Vec<P::Subpixel>>,
    size: ImageSize,
    fill: P,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let mut canvas = ImageBuffer::from_pixel(size.width, size.height, fill);
    let (x, y) = center_offset(size, source.dimensions().into());
    imageops::replace(&mut canvas, source, i64::from(x), i64::from(y));
    canvas
}

/// Result of composing one image.
#[derive(Debug, Clone)]
pub struct Composition {
    pub raster: Canvas,
    pub source_size: ImageSize,
    /// Size after ratio padding, before the border.
    pub padded_size: ImageSize,
    pub final_size: ImageSize,
    /// Decoded color type that was converted to RGB8, if any.
    pub coerced_from: Option<ColorType>,
}

impl Composition {
    /// Where the source's top-left pixel landed in the final raster.
    pub fn source_offset(&self) -> (u32, u32) {
        let (px, py) = center_offset(self.padded_size, self.source_size);
        let (bx, by) = center_offset(self.final_size, self.padded_size);
        (px + bx, py + by)
    }
}

/// Canvas sizes after stage 1 and stage 2, without touching any pixels.
pub fn plan_sizes(source_size: ImageSize, params: &ComposeParams) -> (ImageSize, ImageSize) {
    let padded_size = match params.padding {
        Padding::Ratio(ratio) => compute_canvas_size(source_size, ratio),
        Padding::Even => source_size,
    };
    (padded_size, bordered_size(padded_size, params.border))
}

/// Pad `image` to the requested ratio and add the optional outer border.
///
/// The source is consumed: once it has been copied into the first canvas it
/// is dropped, as is the first canvas once the border stage has copied it.
///
/// Canvases are allocated at the planned size as is. Callers reject plans
/// outside [`ImageSize::fits_canvas_limits`] first.
pub fn compose(image: DynamicImage, params: &ComposeParams) -> Composition {
    let (source, coerced_from) = Canvas::from_image(image);
    if let Some(color) = coerced_from {
        warn!(?color, "unsupported pixel layout converted to RGB8");
    }
    let source_size = source.size();
    let (padded_size, final_size) = plan_sizes(source_size, params);

    let padded = if padded_size == source_size {
        source
    } else {
        source.pad_to(padded_size, params.background)
    };

    let raster = if params.border > 0.0 {
        padded.pad_to(final_size, params.background)
    } else {
        padded
    };

    debug!(
        %source_size,
        %padded_size,
        %final_size,
        mode = %raster.mode(),
        "composed canvas"
    );

    Composition {
        raster,
        source_size,
        padded_size,
        final_size,
        coerced_from,
    }
}
