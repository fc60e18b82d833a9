//! Crop and re-encode picked images

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

use crate::error::{PickerError, Result};
use crate::model::ImageUri;
use crate::picker::{PickedAsset, PickerOptions};

/// Center-crop to the given width:height ratio
pub fn crop_to_aspect(img: &DynamicImage, aspect: (u32, u32)) -> DynamicImage {
    let (aspect_w, aspect_h) = aspect;
    let (width, height) = (img.width(), img.height());

    if aspect_w == 0 || aspect_h == 0 || width == 0 || height == 0 {
        return img.clone();
    }

    let (w, h, aw, ah) = (
        u64::from(width),
        u64::from(height),
        u64::from(aspect_w),
        u64::from(aspect_h),
    );

    if w * ah > h * aw {
        // Too wide
        let crop_w = (h * aw / ah) as u32;
        let x = (width - crop_w) / 2;
        img.crop_imm(x, 0, crop_w, height)
    } else {
        let crop_h = (w * ah / aw) as u32;
        let y = (height - crop_h) / 2;
        img.crop_imm(0, y, width, crop_h)
    }
}

/// Encode as baseline JPEG; `quality` in (0, 1] maps onto 1..=100
pub fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
    let rgb = img.to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode_image(&rgb).map_err(PickerError::Image)?;

    Ok(buffer)
}

/// Decode `source`, crop when editing is allowed, and write a JPEG to `dest`
pub fn prepare_asset(source: &Path, dest: &Path, options: &PickerOptions) -> Result<PickedAsset> {
    if !source.exists() {
        return Err(PickerError::NotFound(source.display().to_string()));
    }

    let img = image::open(source)?;
    let img = if options.allows_editing {
        crop_to_aspect(&img, options.aspect)
    } else {
        img
    };

    let bytes = encode_jpeg(&img, options.quality)?;
    std::fs::write(dest, &bytes)?;

    debug!(
        "Prepared {} -> {} ({}x{}, {} bytes)",
        source.display(),
        dest.display(),
        img.width(),
        img.height(),
        bytes.len()
    );

    Ok(PickedAsset {
        uri: ImageUri::from_path(dest),
        width: img.width(),
        height: img.height(),
    })
}
