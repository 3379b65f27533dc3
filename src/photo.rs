//! Photo normalization for check-in captures.
//!
//! Every stored photo is a bounded-size JPEG: color modes outside RGB and
//! grayscale are flattened to RGB, anything larger than [`MAX_DIMENSION`]
//! on its longer side is downscaled with a high-quality filter, and the
//! result is encoded at a fixed quality.

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

/// Longer-side bound for stored photos, in pixels.
pub const MAX_DIMENSION: u32 = 1024;

/// Fixed JPEG quality for stored photos (0-100).
pub const JPEG_QUALITY: u8 = 88;

/// Decode a capture file and square away its EXIF orientation, so the
/// stored photo is upright regardless of how the camera was held.
pub fn load_capture(path: &Path) -> Result<DynamicImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode capture {}", path.display()))?;
    Ok(match exif_rotation(path) {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    })
}

/// Encode a decoded image as a bounded-size JPEG buffer.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let image = normalize_color(image);
    let image = bound_dimensions(image);

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    image
        .write_with_encoder(encoder)
        .context("JPEG encoding failed")?;
    Ok(buf)
}

/// RGB and grayscale pass through; everything else (alpha, palette, deep
/// color) is flattened to RGB first.
fn normalize_color(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => Cow::Borrowed(image),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// Downscale so the longer dimension equals exactly [`MAX_DIMENSION`],
/// preserving aspect ratio. Images already within bounds are untouched.
fn bound_dimensions(image: Cow<'_, DynamicImage>) -> Cow<'_, DynamicImage> {
    if image.width().max(image.height()) <= MAX_DIMENSION {
        return image;
    }
    Cow::Owned(image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3))
}

/// Convert EXIF orientation value (1-8) to rotation degrees (0, 90, 180, 270).
fn exif_orientation_to_degrees(orientation: u32) -> u32 {
    match orientation {
        6 => 90,
        3 => 180,
        8 => 270,
        _ => 0,
    }
}

/// Read the EXIF orientation tag from a capture file. Missing or
/// unreadable EXIF means no rotation.
fn exif_rotation(path: &Path) -> u32 {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return 0,
    };

    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(e) => e,
        Err(_) => return 0,
    };

    if let Some(field) = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        if let exif::Value::Short(ref v) = field.value {
            if let Some(&orientation) = v.first() {
                return exif_orientation_to_degrees(orientation as u32);
            }
        }
    }

    0
}
