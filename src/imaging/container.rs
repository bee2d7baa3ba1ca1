//! Container-level metadata: EXIF payloads and print density.
//!
//! The `image` decoders expose pixels and the ICC profile but not EXIF or
//! density, and the encoders cannot embed them. This module works on the
//! encoded bytes instead, using `img-parts` for JPEG segments, PNG chunks
//! and WebP chunks:
//!
//! | Field | JPEG | PNG | WebP | TIFF |
//! |---|---|---|---|---|
//! | EXIF | APP1 `Exif\0\0` | `eXIf` | `EXIF` | — |
//! | DPI | APP0 JFIF density | `pHYs` | — | IFD tags 282/283/296 |
//! | ICC (write) | APP2 | `iCCP` | `ICCP` | — |
//!
//! Reading never fails: a malformed container yields no metadata.

use crate::metadata::{Dpi, MetadataBundle};
use image::ImageFormat;
use img_parts::jpeg::Jpeg;
use img_parts::png::{Png, PngChunk};
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF, ImageICC};
use std::io::Write;
use thiserror::Error;

const APP0: u8 = 0xE0;
const JFIF_ID: &[u8] = b"JFIF\0";
const PHYS: [u8; 4] = *b"pHYs";
const IDAT: [u8; 4] = *b"IDAT";
const CM_PER_INCH: f64 = 2.54;
const METERS_PER_INCH: f64 = 0.0254;

/// Metadata found next to the pixels, outside the decoder's reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerExtras {
    pub exif: Option<Vec<u8>>,
    pub dpi: Option<Dpi>,
}

/// Read EXIF and DPI from an encoded image, dispatching on its magic bytes.
pub fn read_extras(data: Bytes) -> ContainerExtras {
    let extras = match image::guess_format(&data) {
        Ok(ImageFormat::Jpeg) => match Jpeg::from_bytes(data) {
            Ok(jpeg) => ContainerExtras {
                exif: jpeg.exif().map(|b| b.to_vec()),
                dpi: jpeg
                    .segments()
                    .iter()
                    .filter(|s| s.marker() == APP0)
                    .find_map(|s| jfif_dpi(s.contents())),
            },
            Err(_) => ContainerExtras::default(),
        },
        Ok(ImageFormat::Png) => match Png::from_bytes(data) {
            Ok(png) => ContainerExtras {
                exif: png.exif().map(|b| b.to_vec()),
                dpi: png
                    .chunks()
                    .iter()
                    .find(|c| c.kind() == PHYS)
                    .and_then(|c| phys_dpi(c.contents())),
            },
            Err(_) => ContainerExtras::default(),
        },
        Ok(ImageFormat::WebP) => match WebP::from_bytes(data) {
            Ok(webp) => ContainerExtras {
                exif: webp.exif().map(|b| b.to_vec()),
                dpi: None,
            },
            Err(_) => ContainerExtras::default(),
        },
        Ok(ImageFormat::Tiff) => ContainerExtras {
            exif: None,
            dpi: tiff_dpi(&data),
        },
        _ => ContainerExtras::default(),
    };
    ContainerExtras {
        dpi: extras.dpi.filter(|d| d.is_valid()),
        ..extras
    }
}

// ---------------------------------------------------------------------------
// Density parsing
// ---------------------------------------------------------------------------

/// Parse a JFIF APP0 payload.
///
/// Layout after `JFIF\0`: version (2), units (1), x density (2), y density (2).
/// Units: 0 = aspect ratio only, 1 = dots per inch, 2 = dots per cm.
fn jfif_dpi(contents: &[u8]) -> Option<Dpi> {
    let body = contents.strip_prefix(JFIF_ID)?;
    if body.len() < 7 {
        return None;
    }
    let x = f64::from(u16::from_be_bytes([body[3], body[4]]));
    let y = f64::from(u16::from_be_bytes([body[5], body[6]]));
    match body[2] {
        1 => Some(Dpi::new(x, y)),
        2 => Some(Dpi::new(x * CM_PER_INCH, y * CM_PER_INCH)),
        _ => None,
    }
}

/// Parse a PNG `pHYs` payload: x ppu (4), y ppu (4), unit (1, 1 = meter).
fn phys_dpi(contents: &[u8]) -> Option<Dpi> {
    if contents.len() < 9 || contents[8] != 1 {
        return None;
    }
    let x = f64::from(u32::from_be_bytes([contents[0], contents[1], contents[2], contents[3]]));
    let y = f64::from(u32::from_be_bytes([contents[4], contents[5], contents[6], contents[7]]));
    Some(Dpi::new(x * METERS_PER_INCH, y * METERS_PER_INCH))
}

const TAG_X_RESOLUTION: u16 = 282;
const TAG_Y_RESOLUTION: u16 = 283;
const TAG_RESOLUTION_UNIT: u16 = 296;

/// Read XResolution/YResolution/ResolutionUnit from the first TIFF IFD.
///
/// ResolutionUnit defaults to inches when absent; unit 1 (no absolute
/// unit) yields no DPI.
fn tiff_dpi(data: &[u8]) -> Option<Dpi> {
    if data.len() < 8 {
        return None;
    }
    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let b: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if big_endian { u16::from_be_bytes(b) } else { u16::from_le_bytes(b) })
    };
    let read_u32 = |offset: usize| -> Option<u32> {
        let b: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if big_endian { u32::from_be_bytes(b) } else { u32::from_le_bytes(b) })
    };
    // RATIONAL values never fit in the entry, so the entry holds an offset
    let read_rational = |entry: usize| -> Option<f64> {
        let offset = read_u32(entry + 8)? as usize;
        let num = read_u32(offset)?;
        let den = read_u32(offset + 4)?;
        (den != 0).then(|| f64::from(num) / f64::from(den))
    };

    if read_u16(2)? != 42 {
        return None;
    }
    let ifd = read_u32(4)? as usize;
    let entry_count = read_u16(ifd)? as usize;

    let (mut x, mut y, mut unit) = (None, None, 2);
    for i in 0..entry_count {
        let entry = ifd + 2 + i * 12;
        match read_u16(entry)? {
            TAG_X_RESOLUTION => x = read_rational(entry),
            TAG_Y_RESOLUTION => y = read_rational(entry),
            // SHORT stored inline, in the first two bytes of the value field
            TAG_RESOLUTION_UNIT => unit = read_u16(entry + 8)?,
            _ => {}
        }
    }

    let (x, y) = (x?, y?);
    match unit {
        2 => Some(Dpi::new(x, y)),
        3 => Some(Dpi::new(x * CM_PER_INCH, y * CM_PER_INCH)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// Build a PNG `pHYs` payload in pixels per meter.
fn phys_contents(dpi: Dpi) -> Vec<u8> {
    let ppm = |v: f64| (v / METERS_PER_INCH).round() as u32;
    let mut contents = Vec::with_capacity(9);
    contents.extend_from_slice(&ppm(dpi.x).to_be_bytes());
    contents.extend_from_slice(&ppm(dpi.y).to_be_bytes());
    contents.push(1);
    contents
}

/// Splice ICC and EXIF (and, for PNG, DPI) into freshly encoded bytes and
/// write the result.
///
/// JPEG density is set by the encoder itself, so `metadata.dpi` is only
/// used here for PNG.
pub fn embed_and_write(
    format: ImageFormat,
    encoded: Vec<u8>,
    metadata: &MetadataBundle,
    mut writer: impl Write,
) -> Result<(), EmbedError> {
    let icc = metadata.icc_profile.clone().map(Bytes::from);
    let exif = metadata.exif.clone().map(Bytes::from);

    match format {
        ImageFormat::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(Bytes::from(encoded))?;
            jpeg.set_icc_profile(icc);
            jpeg.set_exif(exif);
            jpeg.encoder().write_to(writer)?;
        }
        ImageFormat::Png => {
            let mut png = Png::from_bytes(Bytes::from(encoded))?;
            png.set_icc_profile(icc);
            png.set_exif(exif);
            if let Some(dpi) = metadata.dpi {
                let chunks = png.chunks_mut();
                chunks.retain(|c| c.kind() != PHYS);
                let at = chunks
                    .iter()
                    .position(|c| c.kind() == IDAT)
                    .unwrap_or(chunks.len());
                chunks.insert(at, PngChunk::new(PHYS, Bytes::from(phys_contents(dpi))));
            }
            png.encoder().write_to(writer)?;
        }
        ImageFormat::WebP => {
            let mut webp = WebP::from_bytes(Bytes::from(encoded))?;
            webp.set_icc_profile(icc);
            webp.set_exif(exif);
            webp.encoder().write_to(writer)?;
        }
        _ => writer.write_all(&encoded)?,
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed encoder output: {0}")]
    Container(#[from] img_parts::Error),
}
