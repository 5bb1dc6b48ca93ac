/// Filename extensions accepted as receipt photos. Camera captures often
/// carry an unreliable or missing media type, so the extension list is an
/// equal peer of the `image/*` check, not a fallback.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "heic", "heif"];

/// Whether a file looks like an image, by declared media type or by
/// filename extension.
pub fn is_image_like(file_name: &str, content_type: Option<&str>) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image/")) {
        return true;
    }
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
