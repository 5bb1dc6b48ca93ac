pub mod resize;
pub mod validate;

pub use resize::{resize_to_payload, scaled_dimensions, ImagingError, JPEG_QUALITY, PAYLOAD_PREFIX};
pub use validate::{is_image_like, IMAGE_EXTENSIONS};
