// Main entry point for the flux-edge server.
// Parses configuration, builds the upstream client and per-route profiles,
// configures the Axum router, and starts the HTTP server.

mod image_codec;
mod shutdown_signal;
mod upstream;
mod web;

use clap::Parser;
use shutdown_signal::shutdown_signal;
use std::{sync::Arc, time::Duration};
use tracing::Level;
use upstream::{
    DEFAULT_TRUSTED_DOMAIN, DEFAULT_UPSTREAM_URL, GenerationProfile, UpstreamClient,
    get_image_budget,
};
use web::AppState;

/// Command line arguments for flux-edge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct AppConfig {
    /// Hostname/IP to bind the server to.
    /// If this option is specified without value, it will default to "*", meaning the server will listen on all interfaces.
    #[arg(long, env = "FLUX_EDGE_HOST", default_value = "localhost", num_args = 0..=1, default_missing_value = "*")]
    host: String,

    /// Port number to listen on.
    #[arg(short, long, env = "FLUX_EDGE_PORT", default_value_t = 8787)]
    port: u16,

    /// API key for the upstream image API.
    /// Requests fail with a server error while this is unset.
    #[arg(long, env = "BFL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base url of the upstream image API.
    #[arg(long, env = "FLUX_EDGE_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Domains whose hosts may receive the API key when a job is polled.
    /// The upstream base url's own origin is always trusted.
    #[arg(long, env = "FLUX_EDGE_TRUSTED_POLLING_DOMAINS", value_delimiter = ',', default_value = DEFAULT_TRUSTED_DOMAIN)]
    trusted_polling_domains: Vec<String>,

    /// Timeout for each request to the upstream API, in seconds.
    #[arg(long, env = "FLUX_EDGE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Overrides the delay between job status checks for every route, in milliseconds.
    #[arg(long, env = "FLUX_EDGE_POLL_DELAY_MS")]
    poll_delay_ms: Option<u64>,

    /// Maximum log level.
    #[arg(long, env = "FLUX_EDGE_LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

impl AppConfig {
    fn app_state(&self) -> Result<AppState, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()?;

        let mut generate = GenerationProfile::generate();
        let mut create = GenerationProfile::create();
        let mut get_image = get_image_budget();

        if let Some(ms) = self.poll_delay_ms {
            let delay = Duration::from_millis(ms);
            generate = generate.with_poll_delay(delay);
            create = create.with_poll_delay(delay);
            get_image.delay = delay;
        }

        Ok(AppState {
            upstream: UpstreamClient::new(http, self.upstream_url.clone(), self.api_key.clone())
                .with_trusted_domains(self.trusted_polling_domains.iter().cloned()),
            generate,
            create,
            get_image,
        })
    }
}

#[tokio::main]
async fn main() {
    let config = AppConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting flux-edge...");
    tracing::info!("Upstream API: {}", config.upstream_url);

    let state = match config.app_state() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("FATAL: Failed to build HTTP client: {}", e);
            eprintln!("FATAL: Could not build HTTP client. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };
    if !state.upstream.has_api_key() {
        tracing::warn!(
            "No upstream API key configured (BFL_API_KEY). Generation requests will fail until one is set."
        );
    }
    for profile in [&state.generate, &state.create] {
        tracing::info!(
            "Profile '{}': model={}, max_attempts={}, delay={:?}",
            profile.name,
            profile.model_path,
            profile.poll.max_attempts,
            profile.poll.delay
        );
    }

    let app = web::create_app(Arc::new(state));
    tracing::info!("Axum router configured.");

    let listener = match web::create_listener(&config.host, config.port).await {
        Ok((addr, l)) => {
            tracing::info!("Server successfully bound. Listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("FATAL: Failed to bind server: {}", e);
            eprintln!("FATAL: Could not bind server. Error: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server run error: {}", e);
        eprintln!("ERROR: Server shut down unexpectedly. Error: {}", e);
    }

    tracing::info!("flux-edge has shut down.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::try_parse_from(["flux-edge"]).unwrap();
        assert_eq!(config.port, 8787);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.trusted_polling_domains, vec![DEFAULT_TRUSTED_DOMAIN.to_string()]);
    }

    #[test]
    fn test_bare_host_means_all_interfaces() {
        let config = AppConfig::try_parse_from(["flux-edge", "--host"]).unwrap();
        assert_eq!(config.host, "*");
    }

    #[test]
    fn test_poll_delay_override_applies_to_every_route() {
        let config =
            AppConfig::try_parse_from(["flux-edge", "--poll-delay-ms", "250", "--api-key", "k"])
                .unwrap();
        let state = config.app_state().unwrap();
        let delay = Duration::from_millis(250);
        assert_eq!(state.generate.poll.delay, delay);
        assert_eq!(state.create.poll.delay, delay);
        assert_eq!(state.get_image.delay, delay);
        assert_eq!(state.generate.poll.max_attempts, 30);
        assert!(state.upstream.has_api_key());
    }

    #[test]
    fn test_trusted_polling_domains_list() {
        let config = AppConfig::try_parse_from([
            "flux-edge",
            "--trusted-polling-domains",
            "example.com,jobs.example.org",
        ])
        .unwrap();
        let state = config.app_state().unwrap();
        let trusted = |u: &str| {
            state
                .upstream
                .is_trusted_url(&reqwest::Url::parse(u).unwrap())
        };
        assert!(trusted("https://eu.example.com/poll"));
        assert!(trusted("https://jobs.example.org/poll"));
        assert!(!trusted("https://api.us1.bfl.ai/poll"));
        // the configured base url stays trusted
        assert!(trusted("https://api.bfl.ai/v1/get_result"));
    }
}
