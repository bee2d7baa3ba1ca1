//! Image processing, pure Rust and statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode / encode** | `image` codecs (JPEG, PNG, TIFF, WebP) |
//! | **Canvas sizing** | [`compute_canvas_size`], [`bordered_size`] |
//! | **Padding + border** | [`compose`] (`ImageBuffer::from_pixel` + `imageops::replace`) |
//! | **EXIF / DPI / ICC embedding** | `img-parts` container surgery |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing what to compose and how to save
//! - **Compositor**: The two-stage pad-then-border raster builder
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Container**: Metadata that lives in the file container, not the pixels

pub mod backend;
mod calculations;
pub mod compositor;
pub(crate) mod container;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, SourceImage};
pub use calculations::{
    AspectRatio, ImageSize, MAX_CANVAS_PIXELS, MAX_CANVAS_SIDE, RatioError, bordered_size,
    center_offset, compute_canvas_size,
};
pub use compositor::{Canvas, Composition, PixelMode, compose, plan_sizes};
pub use params::{BackgroundColor, ComposeParams, OutputFormat, PRINT_QUALITY, Padding};
pub use rust_backend::{RustBackend, supported_input_extensions};
