// Web server module
// Handles the HTTP API endpoints in front of the upstream image API

mod app;
mod error;
mod extract_request_data;
mod handlers;
mod listeners;
mod models;

pub use app::create_app;
pub use listeners::create_listener;

use crate::upstream::{GenerationProfile, PollBudget, UpstreamClient};
use std::sync::Arc;

// Maximum allowed size for generation requests
pub const MAX_UPLOAD_SIZE_BYTES: usize = 20 * 1024 * 1024; // 20MB

/// Read-only state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    /// Profile of `POST /api/generate`.
    pub generate: GenerationProfile,
    /// Profile of `POST /api/create`.
    pub create: GenerationProfile,
    /// Poll budget of `POST /api/getImage`.
    pub get_image: PollBudget,
}

pub type SharedState = Arc<AppState>;
