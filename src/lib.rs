//! # Print Pad
//!
//! Pads photographs to a print aspect ratio, or surrounds them with a uniform
//! border, without resizing, cropping or resampling a single source pixel.
//! Point it at a folder and every supported image gets a padded sibling in the
//! output folder.
//!
//! # Architecture: Plan, Compose, Save
//!
//! Each image goes through three steps:
//!
//! ```text
//! 1. Plan     source size + settings  →  padded size → final size
//! 2. Compose  decoded raster          →  centered on padding canvas, then border canvas
//! 3. Save     composed raster         →  encoded file + ICC (+ EXIF, DPI)
//! ```
//!
//! Planning is pure arithmetic, so the `check` command can report every size
//! without decoding pixels. Composing is pure raster work with no I/O. Saving
//! is the only step that knows about containers and codecs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Canvas math, the two-stage compositor, decode/encode backend, container metadata |
//! | [`metadata`] | The ICC / EXIF / DPI bundle carried from source to output |
//! | [`types`] | Per-job settings (`RatioSetting`, `PadSettings`, `ProcessingJob`) |
//! | [`config`] | Layered `print-pad.toml` loading, validation, and CLI overrides |
//! | [`naming`] | Supported-extension filter and `{stem}_padded{ext}` output naming |
//! | [`conflict`] | Overwrite / skip / abort decisions for existing outputs |
//! | [`process`] | Job enumeration and the batch driver |
//! | [`output`] | CLI output formatting for progress, summaries, and `check` |
//!
//! # Design Decisions
//!
//! ## Pixels Are Never Resampled
//!
//! The source raster is copied 1:1 onto a larger canvas. Padding is added on the
//! short side only, so the long side never changes. The border then grows both
//! axes of the padded image by the same fraction. A photo that already has the
//! target ratio passes through the padding stage untouched.
//!
//! ## Metadata Goes Through the Container
//!
//! The `image` encoders write pixels and, for most formats, an ICC profile.
//! EXIF and print DPI live in container segments (JPEG APP1/APP0, PNG eXIf/pHYs,
//! WebP EXIF chunk), which `img-parts` splices into the encoded bytes. TIFF is
//! written with the `tiff` crate so the ICC and resolution tags land in the
//! IFD. The ICC profile is always carried; EXIF and DPI only when
//! `preserve_extra_metadata` is on.
//!
//! ## Maximum Quality Only
//!
//! Lossy output is always JPEG quality 100 and WebP is always written lossless.
//! Print shops get what the camera produced plus the padding, nothing less.
//!
//! ## One File, One Verdict
//!
//! A broken or unreadable image fails its own job and is reported; the rest of
//! the batch keeps going. Only an explicit "quit" at the overwrite prompt (or
//! `--on-conflict abort`) stops the batch early.

pub mod config;
pub mod conflict;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
