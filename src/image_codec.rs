// Preparation of uploaded images for inline transmission upstream

use base64::prelude::{BASE64_STANDARD, Engine as _};
use image::ImageFormat;
use tracing::debug;

/// Formats the upstream API accepts as input images.
const ACCEPTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

fn format_from_content_type(content_type: &str) -> Option<ImageFormat> {
    let mime: mime::Mime = content_type.parse().ok()?;
    if mime.type_() != mime::IMAGE {
        return None;
    }
    match mime.subtype().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpeg" | "jpg" | "pjpeg" => Some(ImageFormat::Jpeg),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Determines the format of an uploaded image.
///
/// The magic bytes win over the declared content type; the content type is
/// only consulted when the bytes are not recognized.
pub fn detect_input_format(data: &[u8], content_type: Option<&str>) -> Option<ImageFormat> {
    image::guess_format(data)
        .ok()
        .or_else(|| content_type.and_then(format_from_content_type))
}

/// Base64-encodes an uploaded image after checking its format is accepted.
pub fn encode_input_image(data: &[u8], content_type: Option<&str>) -> Result<String, String> {
    let format = detect_input_format(data, content_type).ok_or_else(|| {
        format!(
            "Unsupported image type {}. Expected PNG, JPEG or WebP.",
            content_type.unwrap_or("(unknown)")
        )
    })?;

    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format {:?}. Expected PNG, JPEG or WebP.",
            format
        ));
    }

    debug!("Encoding {:?} input image ({} bytes)", format, data.len());
    Ok(BASE64_STANDARD.encode(data))
}
