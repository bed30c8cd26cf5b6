// Client for the upstream asynchronous image-generation API.
// Submits generation jobs and fetches job status for the poll loop.

mod error;
mod models;
mod poll;
mod profile;

pub use error::{PollError, SubmitError};
pub use poll::{StatusFetcher, poll_until_ready};
pub use profile::{DEFAULT_DIMENSION, DEFAULT_PROMPT, GenerationProfile, PollBudget, get_image_budget};

use crate::image_codec::encode_input_image;
use models::{PollResponse, StartResponse, SubmitBody};
use reqwest::{Url, header};
use tracing::{debug, info, warn};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.bfl.ai/v1";

/// Domain whose hosts (and subdomains) may receive the API key when polled.
/// Polling urls handed out by the upstream live on regional subdomains.
pub const DEFAULT_TRUSTED_DOMAIN: &str = "bfl.ai";

/// Header carrying the upstream API key.
const API_KEY_HEADER: &str = "x-key";

/// A single image-generation request as received from a client.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    pub image: Option<Vec<u8>>,
    /// Content type declared by the uploader, if any.
    pub image_content_type: Option<String>,
    pub width: u32,
    pub height: u32,
}

/// A submitted upstream job, identified by its polling url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingJob {
    pub id: Option<String>,
    pub polling_url: String,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    trusted_domains: Vec<String>,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            trusted_domains: vec![DEFAULT_TRUSTED_DOMAIN.to_string()],
        }
    }

    pub fn with_trusted_domains(mut self, domains: impl IntoIterator<Item = String>) -> Self {
        self.trusted_domains = domains
            .into_iter()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    /// Whether `url` belongs to the upstream API and may carry the API key.
    ///
    /// Same origin as the configured base url, or an https url on a trusted
    /// domain or one of its subdomains.
    pub fn is_trusted_url(&self, url: &Url) -> bool {
        if Url::parse(&self.base_url).is_ok_and(|base| base.origin() == url.origin()) {
            return true;
        }
        if url.scheme() != "https" {
            return false;
        }
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        self.trusted_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Submits a generation job and returns its polling url.
    ///
    /// Nothing is sent upstream unless an API key is configured and the
    /// request carries an image and a usable prompt.
    pub async fn submit(
        &self,
        profile: &GenerationProfile,
        request: &GenerationRequest,
    ) -> Result<PollingJob, SubmitError> {
        let api_key = self.api_key.as_deref().ok_or(SubmitError::Config)?;

        let image = request
            .image
            .as_deref()
            .filter(|data| !data.is_empty())
            .ok_or_else(|| SubmitError::Validation("Missing image".to_string()))?;

        let prompt = profile
            .resolve_prompt(request.prompt.as_deref())
            .ok_or_else(|| SubmitError::Validation("Missing prompt".to_string()))?;

        if request.width == 0 || request.height == 0 {
            return Err(SubmitError::Validation(
                "Width and height must be positive integers".to_string(),
            ));
        }

        let input_image = encode_input_image(image, request.image_content_type.as_deref())
            .map_err(SubmitError::Validation)?;

        let body = SubmitBody {
            prompt,
            input_image,
            seed: profile.seed,
            width: request.width,
            height: request.height,
            safety_tolerance: profile.safety_tolerance,
            output_format: profile.output_format,
        };

        let url = format!("{}/{}", self.base_url, profile.model_path);
        info!(
            "Submitting '{}' job to {} ({}x{}, {} byte image)",
            profile.name,
            url,
            request.width,
            request.height,
            image.len()
        );

        let resp = self
            .http
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(SubmitError::Upstream { status, body: text });
        }

        let start: StartResponse =
            serde_json::from_str(&text).map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;
        debug!("Submission accepted: id={:?}", start.id);

        let polling_url = start
            .polling_url
            .filter(|u| !u.is_empty())
            .ok_or(SubmitError::MissingPollingUrl)?;

        Ok(PollingJob {
            id: start.id,
            polling_url,
        })
    }
}

impl StatusFetcher for UpstreamClient {
    async fn fetch_status(&self, job_url: &str) -> Result<PollResponse, PollError> {
        let url = Url::parse(job_url)
            .map_err(|e| PollError::Transport(format!("invalid polling url: {}", e)))?;

        // The key only goes to the upstream API itself
        let api_key = self.api_key.as_deref().filter(|_| self.is_trusted_url(&url));
        if api_key.is_none() && self.api_key.is_some() {
            warn!(
                "Polling {} without the API key: host is not trusted",
                url.host_str().unwrap_or_default()
            );
        }

        let mut req = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(key) = api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PollError::Transport(format!("{}: {}", status, body)));
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| PollError::InvalidPayload(e.to_string()))
    }
}
