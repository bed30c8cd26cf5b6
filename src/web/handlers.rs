// API handlers for the web server

use super::{
    SharedState,
    error::ApiError,
    extract_request_data::extract_generation_request,
    models::{GetImageRequest, ImageResponse},
};
use crate::upstream::{DEFAULT_PROMPT, GenerationProfile, SubmitError, poll_until_ready};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

// --- GET / ---
// Describes the available endpoints
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/generate": {
                "description": "Generate an image from an uploaded image and an optional prompt",
                "body": "multipart/form-data: image (required), prompt, width, height",
                "defaultPrompt": DEFAULT_PROMPT,
                "response": { "image": "<url>" },
            },
            "POST /api/create": {
                "description": "Generate an image from an uploaded image and a required prompt",
                "body": "multipart/form-data: image (required), prompt (required), width, height",
                "response": { "image": "<url>" },
            },
            "POST /api/getImage": {
                "description": "Wait for a previously submitted job and return its image",
                "body": { "imageUrl": "<polling url>" },
                "response": { "image": "<url>" },
            },
        },
    }))
}

// --- POST /api/generate ---
pub async fn generate(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let profile = state.generate.clone();
    run_generation(state, profile, multipart).await
}

// --- POST /api/create ---
pub async fn create(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let profile = state.create.clone();
    run_generation(state, profile, multipart).await
}

// Submit-then-poll sequence shared by the generation routes
async fn run_generation(
    state: SharedState,
    profile: GenerationProfile,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    if !state.upstream.has_api_key() {
        return Err(SubmitError::Config.into());
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("generation", route = profile.name, %request_id);

    async move {
        let request = extract_generation_request(multipart?).await?;
        let job = state.upstream.submit(&profile, &request).await?;
        info!("Job submitted: id={:?}, polling", job.id);

        let image = poll_until_ready(&state.upstream, &job.polling_url, profile.poll).await?;
        info!("Image ready: {}", image);

        Ok::<_, ApiError>(Json(ImageResponse { image }))
    }
    .instrument(span)
    .await
}

// --- POST /api/getImage ---
// Polls a caller-supplied status url until the job finishes
pub async fn get_image(
    State(state): State<SharedState>,
    payload: Result<Json<GetImageRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    if !state.upstream.has_api_key() {
        return Err(SubmitError::Config.into());
    }

    let Json(payload) = payload?;

    let image_url = payload
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing imageUrl".to_string()))?;

    let parsed = reqwest::Url::parse(&image_url)
        .map_err(|e| ApiError::BadRequest(format!("Invalid imageUrl: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest(
            "Invalid imageUrl: expected an http(s) url".to_string(),
        ));
    }
    if !state.upstream.is_trusted_url(&parsed) {
        return Err(ApiError::BadRequest(
            "Invalid imageUrl: not a polling url of the upstream API".to_string(),
        ));
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("get_image", %request_id);

    async move {
        info!("Polling caller-supplied job url");
        let image = poll_until_ready(&state.upstream, parsed.as_str(), state.get_image).await?;
        info!("Image ready: {}", image);
        Ok::<_, ApiError>(Json(ImageResponse { image }))
    }
    .instrument(span)
    .await
}
