use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use thiserror::Error;

/// Fixed lossy quality factor for the re-encoded payload.
pub const JPEG_QUALITY: u8 = 82;

/// Every payload produced by [`resize_to_payload`] starts with this.
pub const PAYLOAD_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode resized image: {0}")]
    Encode(String),
}

/// Bound a photo to `max_dimension` on its longest side and re-encode it as a
/// JSON-transmittable data-URL payload.
///
/// `scale = min(1, max_dimension / max(w, h))` — the image is never upscaled,
/// and each target dimension is floored at 1 pixel. A decode failure aborts
/// with no partial output.
pub fn resize_to_payload(data: &[u8], max_dimension: u32) -> Result<String, ImagingError> {
    let img = image::load_from_memory(data)?;
    let (out_w, out_h) = scaled_dimensions(img.width(), img.height(), max_dimension);

    let img = if (out_w, out_h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(out_w, out_h, image::imageops::FilterType::Lanczos3)
    };

    encode_as_payload(img)
}

/// Target dimensions for a bounded resize: `round(dim * scale)`, floored at
/// 1 pixel, with scale clamped so no dimension ever grows.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height).max(1);
    let scale = (f64::from(max_dimension) / f64::from(longest)).min(1.0);
    let out_w = ((f64::from(width) * scale).round() as u32).max(1);
    let out_h = ((f64::from(height) * scale).round() as u32).max(1);
    (out_w, out_h)
}

fn encode_as_payload(img: DynamicImage) -> Result<String, ImagingError> {
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(format!("{PAYLOAD_PREFIX}{}", BASE64.encode(&buf)))
}
