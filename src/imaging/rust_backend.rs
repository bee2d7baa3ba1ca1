//! Pure Rust image backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate decoders |
//! | ICC capture | `ImageDecoder::icc_profile` |
//! | EXIF / DPI capture | [`container::read_extras`](super::container::read_extras) |
//! | Encode → JPEG | `JpegEncoder`, quality 100, JFIF density for DPI |
//! | Encode → PNG | `PngEncoder`, `pHYs` chunk for DPI |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → TIFF | `tiff` crate directly, ICC and resolution tags in the IFD (no EXIF) |
//! | ICC / EXIF embedding | `img-parts` via [`container::embed_and_write`](super::container::embed_and_write) |
//!
//! Saves go to a temp file in the destination folder that is renamed over
//! the output only once it is complete.

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::calculations::ImageSize;
use super::container::{self, EmbedError};
use super::params::{OutputFormat, PRINT_QUALITY};
use crate::metadata::{Dpi, MetadataBundle};
use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use img_parts::Bytes;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use std::sync::LazyLock;
use tempfile::NamedTempFile;
use tiff::encoder::{Rational, TiffEncoder, colortype};
use tiff::tags::{ResolutionUnit, Tag};
use tracing::{debug, warn};

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Lowercase extensions that can be both decoded and re-encoded.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode pixels and the ICC profile in one pass over `data`.
fn decode_with_icc(
    data: &[u8],
    path: &Path,
) -> Result<(DynamicImage, Option<Vec<u8>>), BackendError> {
    let decode_err = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    };
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_decoder()
        .map_err(decode_err)?;
    // A malformed profile is not worth failing the whole image over
    let icc = decoder.icc_profile().unwrap_or_else(|e| {
        warn!("ignoring unreadable ICC profile in {}: {e}", path.display());
        None
    });
    let image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    Ok((image, icc))
}

/// Clamp a DPI value into the JFIF 16-bit density field.
fn jfif_density(value: f64) -> u16 {
    value.round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// DPI as a TIFF RATIONAL with two decimals of precision.
fn tiff_resolution(value: f64) -> Rational {
    Rational {
        n: (value * 100.0).round().clamp(1.0, f64::from(u32::MAX)) as u32,
        d: 100,
    }
}

/// Write an uncompressed TIFF with the ICC profile and resolution in the
/// first IFD.
///
/// Canvases are RGB8, RGBA8 or Luma8; anything else is widened to RGB8 or
/// RGBA8 first.
fn encode_tiff(
    raster: &DynamicImage,
    icc: Option<&[u8]>,
    dpi: Option<Dpi>,
) -> Result<Vec<u8>, tiff::TiffError> {
    let mut buf = Vec::new();
    let mut tiff = TiffEncoder::new(Cursor::new(&mut buf))?;
    let (width, height) = (raster.width(), raster.height());

    macro_rules! write_image {
        ($color:ty, $data:expr) => {{
            let mut frame = tiff.new_image::<$color>(width, height)?;
            if let Some(dpi) = dpi {
                frame.resolution_unit(ResolutionUnit::Inch);
                frame.x_resolution(tiff_resolution(dpi.x));
                frame.y_resolution(tiff_resolution(dpi.y));
            }
            if let Some(icc) = icc {
                frame.encoder().write_tag(Tag::IccProfile, icc)?;
            }
            frame.write_data($data)?;
        }};
    }

    match raster {
        DynamicImage::ImageRgb8(pixels) => write_image!(colortype::RGB8, pixels.as_raw()),
        DynamicImage::ImageRgba8(pixels) => write_image!(colortype::RGBA8, pixels.as_raw()),
        DynamicImage::ImageLuma8(pixels) => write_image!(colortype::Gray8, pixels.as_raw()),
        other if other.color().has_alpha() => {
            write_image!(colortype::RGBA8, other.to_rgba8().as_raw())
        }
        other => write_image!(colortype::RGB8, other.to_rgb8().as_raw()),
    }
    Ok(buf)
}

/// JPEG at [`PRINT_QUALITY`], with the JFIF density set when `dpi` is given.
fn encode_jpeg(
    raster: &DynamicImage,
    dpi: Option<Dpi>,
    buf: &mut Vec<u8>,
) -> Result<(), image::ImageError> {
    let mut encoder = JpegEncoder::new_with_quality(buf, PRINT_QUALITY);
    if let Some(dpi) = dpi {
        encoder.set_pixel_density(PixelDensity {
            density: (jfif_density(dpi.x), jfif_density(dpi.y)),
            unit: PixelDensityUnit::Inches,
        });
    }
    // JPEG has no alpha channel
    if raster.color().has_alpha() {
        DynamicImage::ImageRgb8(raster.to_rgb8()).write_with_encoder(encoder)
    } else {
        raster.write_with_encoder(encoder)
    }
}

/// Encode `raster` into an in-memory buffer for `format`.
///
/// TIFF embeds `icc` itself. For the other containers the ICC profile is
/// spliced in afterwards by [`container::embed_and_write`].
fn encode(
    raster: &DynamicImage,
    format: OutputFormat,
    icc: Option<&[u8]>,
    dpi: Option<Dpi>,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let result = match format {
        OutputFormat::Jpeg => encode_jpeg(raster, dpi, &mut buf),
        OutputFormat::Png => raster.write_with_encoder(PngEncoder::new(&mut buf)),
        OutputFormat::WebP => raster.write_with_encoder(WebPEncoder::new_lossless(&mut buf)),
        OutputFormat::Tiff => {
            return encode_tiff(raster, icc, dpi).map_err(|e| {
                BackendError::ProcessingFailed(format!("{format} encode failed: {e}"))
            });
        }
    };
    result.map_err(|e| BackendError::ProcessingFailed(format!("{format} encode failed: {e}")))?;
    Ok(buf)
}

fn image_format(format: OutputFormat) -> ImageFormat {
    match format {
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Tiff => ImageFormat::Tiff,
        OutputFormat::WebP => ImageFormat::WebP,
    }
}

/// Log every captured field the output container cannot hold.
fn warn_dropped_fields(metadata: &MetadataBundle, format: OutputFormat, path: &Path) {
    if metadata.exif.is_some() && !format.carries_exif() {
        warn!("{format} output cannot carry EXIF: {}", path.display());
    }
    if metadata.dpi.is_some() && !format.carries_dpi() {
        warn!("{format} output cannot carry DPI: {}", path.display());
    }
}

/// Folder the temp file is created in, so the final rename stays on one
/// filesystem.
fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<ImageSize, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(ImageSize::new(width, height))
    }

    fn load(&self, path: &Path) -> Result<SourceImage, BackendError> {
        let data = Bytes::from(std::fs::read(path)?);
        let (image, icc_profile) = decode_with_icc(&data, path)?;
        let extras = container::read_extras(data);

        let metadata = MetadataBundle {
            icc_profile,
            exif: extras.exif,
            dpi: extras.dpi,
        };
        debug!(
            "loaded {} ({}x{}, {:?}), metadata: {}",
            path.display(),
            image.width(),
            image.height(),
            image.color(),
            metadata.describe()
        );
        Ok(SourceImage { image, metadata })
    }

    fn save(
        &self,
        raster: &DynamicImage,
        metadata: &MetadataBundle,
        path: &Path,
    ) -> Result<(), BackendError> {
        let format = OutputFormat::from_path(path)
            .ok_or_else(|| BackendError::UnsupportedFormat(path.display().to_string()))?;
        warn_dropped_fields(metadata, format, path);

        let dpi = metadata.dpi.filter(|_| format.carries_dpi());
        let encoded = encode(raster, format, metadata.icc_profile.as_deref(), dpi)?;

        let mut staged = NamedTempFile::new_in(staging_dir(path))?;
        let mut writer = BufWriter::new(staged.as_file_mut());
        container::embed_and_write(image_format(format), encoded, metadata, &mut writer)
            .map_err(|e| match e {
                EmbedError::Io(io) => BackendError::Io(io),
                other => BackendError::ProcessingFailed(format!(
                    "Failed to embed metadata in {}: {}",
                    path.display(),
                    other
                )),
            })?;
        writer.flush()?;
        drop(writer);
        staged.persist(path).map_err(|e| BackendError::Io(e.error))?;
        debug!("saved {} as {format}, metadata: {}", path.display(), metadata.describe());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        create_test_jpeg, create_test_png, gradient_rgb, sample_exif, sample_icc,
    };
    use image::{GenericImageView, RgbImage, RgbaImage};

    fn full_metadata() -> MetadataBundle {
        MetadataBundle {
            icc_profile: Some(sample_icc()),
            exif: Some(sample_exif()),
            dpi: Some(Dpi::new(300.0, 300.0)),
        }
    }

    #[test]
    fn supported_extensions_match_print_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
        assert!(!exts.contains(&"gif"));
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let size = RustBackend::new().identify(&path).unwrap();
        assert_eq!(size, ImageSize::new(200, 150));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn load_nonexistent_file_is_io_error() {
        let result = RustBackend::new().load(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn load_garbage_is_processing_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = RustBackend::new().load(&path);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn load_plain_jpeg_has_no_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        create_test_jpeg(&path, 64, 48);

        let source = RustBackend::new().load(&path).unwrap();
        assert_eq!(source.image.dimensions(), (64, 48));
        assert_eq!(source.metadata.icc_profile, None);
        assert_eq!(source.metadata.exif, None);
    }

    #[test]
    fn png_save_and_load_keeps_pixels_and_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let raster = DynamicImage::ImageRgb8(gradient_rgb(40, 30));
        let backend = RustBackend::new();

        backend.save(&raster, &full_metadata(), &path).unwrap();
        let loaded = backend.load(&path).unwrap();

        assert_eq!(loaded.image.to_rgb8(), raster.to_rgb8());
        assert_eq!(loaded.metadata.icc_profile, Some(sample_icc()));
        assert_eq!(loaded.metadata.exif, Some(sample_exif()));
        let dpi = loaded.metadata.dpi.unwrap();
        assert!((dpi.x - 300.0).abs() < 0.1, "x dpi was {}", dpi.x);
        assert!((dpi.y - 300.0).abs() < 0.1, "y dpi was {}", dpi.y);
    }

    #[test]
    fn jpeg_save_and_load_keeps_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        let raster = DynamicImage::ImageRgb8(gradient_rgb(64, 64));
        let backend = RustBackend::new();

        backend.save(&raster, &full_metadata(), &path).unwrap();
        let loaded = backend.load(&path).unwrap();

        assert_eq!(loaded.image.dimensions(), (64, 64));
        assert_eq!(loaded.metadata.icc_profile, Some(sample_icc()));
        assert_eq!(loaded.metadata.exif, Some(sample_exif()));
        assert_eq!(loaded.metadata.dpi, Some(Dpi::new(300.0, 300.0)));
    }

    #[test]
    fn jpeg_save_with_icc_only_has_no_exif() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        let backend = RustBackend::new();
        let metadata = full_metadata().for_save(false);

        backend
            .save(&DynamicImage::ImageRgb8(gradient_rgb(32, 32)), &metadata, &path)
            .unwrap();
        let loaded = backend.load(&path).unwrap();

        assert_eq!(loaded.metadata.icc_profile, Some(sample_icc()));
        assert_eq!(loaded.metadata.exif, None);
    }

    #[test]
    fn jpeg_save_flattens_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("alpha.jpg");
        let raster = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            10,
            10,
            image::Rgba([255, 0, 0, 255]),
        ));

        RustBackend::new()
            .save(&raster, &MetadataBundle::default(), &path)
            .unwrap();
        assert_eq!(RustBackend::new().identify(&path).unwrap(), ImageSize::new(10, 10));
    }

    #[test]
    fn webp_save_is_lossless() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.webp");
        let raster = DynamicImage::ImageRgb8(gradient_rgb(24, 16));
        let backend = RustBackend::new();

        backend.save(&raster, &MetadataBundle::default(), &path).unwrap();
        let loaded = backend.load(&path).unwrap();

        assert_eq!(loaded.image.to_rgb8(), raster.to_rgb8());
    }

    #[test]
    fn webp_save_embeds_exif_but_not_dpi() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.webp");

        RustBackend::new()
            .save(&DynamicImage::ImageRgb8(gradient_rgb(8, 8)), &full_metadata(), &path)
            .unwrap();
        let extras = container::read_extras(Bytes::from(std::fs::read(&path).unwrap()));

        assert_eq!(extras.exif, Some(sample_exif()));
        assert_eq!(extras.dpi, None);
    }

    #[test]
    fn tiff_save_keeps_icc_and_dpi() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.tif");
        let raster = DynamicImage::ImageRgb8(gradient_rgb(12, 8));
        let backend = RustBackend::new();

        backend.save(&raster, &full_metadata(), &path).unwrap();
        let loaded = backend.load(&path).unwrap();

        assert_eq!(loaded.image.to_rgb8(), raster.to_rgb8());
        assert_eq!(loaded.metadata.icc_profile, Some(sample_icc()));
        assert_eq!(loaded.metadata.dpi, Some(Dpi::new(300.0, 300.0)));
        assert_eq!(loaded.metadata.exif, None);
    }

    #[test]
    fn tiff_save_with_alpha_keeps_icc() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("alpha.tiff");
        let raster = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            6,
            4,
            image::Rgba([10, 20, 30, 255]),
        ));
        let metadata = full_metadata().for_save(false);

        RustBackend::new().save(&raster, &metadata, &path).unwrap();
        let loaded = RustBackend::new().load(&path).unwrap();

        assert_eq!(loaded.image.to_rgba8(), raster.to_rgba8());
        assert_eq!(loaded.metadata.icc_profile, Some(sample_icc()));
        assert_eq!(loaded.metadata.dpi, None);
    }

    #[test]
    fn tiff_resolution_keeps_fractional_dpi() {
        let parts = |r: Rational| (r.n, r.d);
        assert_eq!(parts(tiff_resolution(300.0)), (30_000, 100));
        assert_eq!(parts(tiff_resolution(72.5)), (7_250, 100));
        assert_eq!(parts(tiff_resolution(0.0)), (1, 100));
    }

    #[test]
    fn failed_encode_leaves_existing_output_untouched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        std::fs::write(&path, b"previous output").unwrap();
        // wider than a JPEG frame header can express
        let raster = DynamicImage::ImageRgb8(RgbImage::new(70_000, 1));

        let result = RustBackend::new().save(&raster, &MetadataBundle::default(), &path);

        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"previous output");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_rename_cleans_up_staged_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = tmp.path().join("out.png");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), b"x").unwrap();

        let result = RustBackend::new().save(
            &DynamicImage::ImageRgb8(gradient_rgb(4, 4)),
            &MetadataBundle::default(),
            &path,
        );

        assert!(matches!(result, Err(BackendError::Io(_))));
        assert!(path.join("keep.txt").exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn save_replaces_existing_output_without_leftovers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        std::fs::write(&path, b"previous output").unwrap();
        let raster = DynamicImage::ImageRgb8(gradient_rgb(9, 9));

        RustBackend::new()
            .save(&raster, &MetadataBundle::default(), &path)
            .unwrap();

        let loaded = RustBackend::new().load(&path).unwrap();
        assert_eq!(loaded.image.to_rgb8(), raster.to_rgb8());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn save_to_unknown_extension_is_unsupported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.gif");
        let result = RustBackend::new().save(
            &DynamicImage::ImageRgb8(RgbImage::new(2, 2)),
            &MetadataBundle::default(),
            &path,
        );
        assert!(matches!(result, Err(BackendError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn load_reads_png_written_elsewhere() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("src.png");
        create_test_png(&path, 5, 7);

        let source = RustBackend::new().load(&path).unwrap();
        assert_eq!(source.image.dimensions(), (5, 7));
        assert!(source.metadata.is_empty());
    }

    #[test]
    fn jfif_density_clamps_into_u16() {
        assert_eq!(jfif_density(299.6), 300);
        assert_eq!(jfif_density(0.2), 1);
        assert_eq!(jfif_density(1e9), u16::MAX);
    }
}
