// API-specific data models for the web server

use serde::{Deserialize, Serialize};

/// Successful response of every generation endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ImageResponse {
    pub image: String,
}

/// Body of `POST /api/getImage`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GetImageRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}
