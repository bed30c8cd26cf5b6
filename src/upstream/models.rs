// Wire models for the upstream image-generation API

use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON body posted to the upstream model endpoint.
#[derive(Serialize, Debug, Clone)]
pub struct SubmitBody<'a> {
    pub prompt: &'a str,
    pub input_image: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub safety_tolerance: u8,
    pub output_format: &'a str,
}

/// Response to a submission. Only `polling_url` is required for the flow.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct StartResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub polling_url: Option<String>,
}

/// Upstream job state as reported by the polling endpoint
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String")]
pub enum JobStatus {
    Pending,
    Ready,
    /// Anything else ("Error", "Request Moderated", ...) is terminal.
    Other(String),
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Pending" => JobStatus::Pending,
            "Ready" => JobStatus::Ready,
            _ => JobStatus::Other(value),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => f.write_str("Pending"),
            JobStatus::Ready => f.write_str("Ready"),
            JobStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PollResult {
    #[serde(default)]
    pub sample: Option<String>,
}

/// Payload returned by the polling endpoint.
///
/// The generated image may be reported either as `result.sample` or as a
/// top-level `sample`.
#[derive(Deserialize, Debug, Clone)]
pub struct PollResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<PollResult>,
    #[serde(default)]
    pub sample: Option<String>,
}

impl PollResponse {
    /// Image url of a finished job, preferring the nested result.
    pub fn image_url(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|r| r.sample.as_deref())
            .filter(|s| !s.is_empty())
            .or_else(|| self.sample.as_deref().filter(|s| !s.is_empty()))
    }
}
