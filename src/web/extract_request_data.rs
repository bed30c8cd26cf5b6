use axum::extract::{Multipart, multipart::Field};
use tracing::{debug, warn};

use super::error::ApiError;
use crate::upstream::{DEFAULT_DIMENSION, GenerationRequest};

/// Reads a generation request out of a multipart form.
///
/// Recognized fields are `prompt`, `image`, `width` and `height`; anything
/// else is ignored. Presence of the image and prompt is checked later by the
/// submitter so that the route's prompt policy applies.
pub async fn extract_generation_request(
    mut multipart: Multipart,
) -> Result<GenerationRequest, ApiError> {
    let mut request = GenerationRequest {
        width: DEFAULT_DIMENSION,
        height: DEFAULT_DIMENSION,
        ..Default::default()
    };
    let mut ignored_fields = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to process multipart field: {}", e)))?
    {
        match field.name() {
            Some("image") => {
                if request.image.is_some() {
                    warn!("Multiple 'image' fields found in multipart request, using the last one");
                }
                let content_type = field.content_type().map(str::to_string);
                debug!("Received image with content type: {:?}", content_type);

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image data: {}", e)))?;

                request.image = Some(data.to_vec());
                request.image_content_type = content_type;
            }
            Some("prompt") => {
                request.prompt = Some(read_text(field, "prompt").await?);
            }
            Some("width") => {
                request.width = parse_dimension(&read_text(field, "width").await?, "width")?;
            }
            Some("height") => {
                request.height = parse_dimension(&read_text(field, "height").await?, "height")?;
            }
            other => {
                debug!("Ignoring multipart field: {}", other.unwrap_or("unnamed"));
                ignored_fields += 1;
            }
        }
    }

    if ignored_fields > 0 {
        debug!("Ignored {} unknown fields in multipart request", ignored_fields);
    }

    Ok(request)
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}' field: {}", name, e)))
}

/// Parses a width or height; a blank value means the default.
pub fn parse_dimension(value: &str, name: &str) -> Result<u32, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(DEFAULT_DIMENSION);
    }

    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid {}: '{}' is not a positive integer",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("768", "width").unwrap(), 768);
        assert_eq!(parse_dimension(" 512 ", "width").unwrap(), 512);
        assert_eq!(parse_dimension("", "width").unwrap(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_parse_dimension_rejects_non_positive() {
        for bad in ["0", "-5", "12.5", "wide"] {
            match parse_dimension(bad, "height") {
                Err(ApiError::BadRequest(msg)) => assert!(msg.contains("height")),
                other => panic!("expected bad request for {:?}, got {:?}", bad, other),
            }
        }
    }
}
