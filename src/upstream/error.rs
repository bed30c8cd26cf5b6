// Error types for calls against the upstream image-generation API

use reqwest::StatusCode;
use thiserror::Error;

/// Failure while submitting a generation request.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Server is missing the upstream API key")]
    Config,

    #[error("{0}")]
    Validation(String),

    #[error("Upstream API returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("Failed to reach upstream API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream API returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Upstream API returned no polling url")]
    MissingPollingUrl,
}

/// Failure while polling an upstream job for its result.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Failed to fetch job status: {0}")]
    Transport(String),

    #[error("Job status payload could not be read: {0}")]
    InvalidPayload(String),

    #[error("Job ended with unexpected status '{0}'")]
    UnexpectedStatus(String),

    #[error("Job still pending after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("Job is ready but carries no image url")]
    MissingResult,
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        PollError::Transport(err.to_string())
    }
}
