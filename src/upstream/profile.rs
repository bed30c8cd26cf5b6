// Per-route generation settings

use std::time::Duration;

/// Prompt used when a lenient route receives no prompt.
pub const DEFAULT_PROMPT: &str =
    "Reimagine this image as a detailed, high quality illustration while keeping its composition";

pub const DEFAULT_DIMENSION: u32 = 1024;

/// How a route treats a missing or blank prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPolicy {
    /// Substitute [`DEFAULT_PROMPT`].
    Fallback,
    /// Reject the request.
    Required,
}

/// Attempt budget and cadence of a poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollBudget {
    pub const fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Worst-case time spent sleeping between status checks.
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Fixed upstream parameters for one inbound route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationProfile {
    pub name: &'static str,
    /// Path of the model endpoint, relative to the upstream base url.
    pub model_path: &'static str,
    pub seed: u64,
    pub safety_tolerance: u8,
    pub output_format: &'static str,
    pub prompt_policy: PromptPolicy,
    pub poll: PollBudget,
}

impl GenerationProfile {
    /// `/api/generate`: lenient prompt, JPEG output.
    pub fn generate() -> Self {
        Self {
            name: "generate",
            model_path: "flux-kontext-pro",
            seed: 42,
            safety_tolerance: 2,
            output_format: "jpeg",
            prompt_policy: PromptPolicy::Fallback,
            poll: PollBudget::new(30, 1_000),
        }
    }

    /// `/api/create`: prompt required, PNG output, longer budget.
    pub fn create() -> Self {
        Self {
            name: "create",
            model_path: "flux-kontext-pro",
            seed: 1234,
            safety_tolerance: 6,
            output_format: "png",
            prompt_policy: PromptPolicy::Required,
            poll: PollBudget::new(45, 2_000),
        }
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll.delay = delay;
        self
    }

    /// Resolves the prompt a request is submitted with.
    pub fn resolve_prompt<'a>(&self, prompt: Option<&'a str>) -> Option<&'a str> {
        match prompt.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(p),
            None => match self.prompt_policy {
                PromptPolicy::Fallback => Some(DEFAULT_PROMPT),
                PromptPolicy::Required => None,
            },
        }
    }
}

/// Budget for `/api/getImage`, which polls a caller-supplied url.
pub fn get_image_budget() -> PollBudget {
    PollBudget::new(10, 3_000)
}
