//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use crate::ServerConfig;
use crate::rate_limit::RateLimitConfig;
use clap::Parser;
use tracing::error;
use url::Url;

const SESSION_SECRET_ENV: &str = "SESSION_SECRET_KEY";
const MIN_SESSION_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bikebroker",
    about = "Dashboard server for the bike brokerage REST API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Base URL of the backend REST API (e.g., "https://api.example.com/v1")
    #[arg(long, env = "NEXT_PUBLIC_API_URL")]
    pub api_url: String,

    /// Path to file containing the session secret. Prefer using SESSION_SECRET_KEY env var instead
    #[arg(long)]
    pub session_secret_file: Option<String>,

    /// Public origin of this server; HTTPS enables Secure cookies
    #[arg(long, env = "PUBLIC_ORIGIN", default_value = "http://localhost:3000")]
    pub origin: String,

    /// Timeout for backend requests in seconds (no timeout when unset)
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Take client IPs from X-Forwarded-For (only behind a trusted proxy)
    #[arg(long)]
    pub trust_proxy: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load the session secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_session_secret(session_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(SESSION_SECRET_ENV) {
        // SAFETY: called during startup before any other thread is spawned,
        // and nothing else reads this variable.
        unsafe { std::env::remove_var(SESSION_SECRET_ENV) };
        secret
    } else if let Some(path) = session_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read session secret file");
                return None;
            }
        }
    } else {
        error!(
            "Session secret is required. Set {} environment variable (recommended) or use --session-secret-file",
            SESSION_SECRET_ENV
        );
        return None;
    };

    if secret.len() < MIN_SESSION_SECRET_LENGTH {
        error!(
            "Session secret is shorter than {} characters. Use a longer secret",
            MIN_SESSION_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Parse and validate the backend API URL.
/// Returns None and logs an error if validation fails.
pub fn validate_api_url(api_url: &str) -> Option<Url> {
    let url = match Url::parse(api_url) {
        Ok(url) => url,
        Err(e) => {
            error!(url = %api_url, error = %e, "Invalid API URL");
            return None;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        error!(url = %api_url, "API URL must use http or https");
        return None;
    }

    Some(url)
}

/// Parse and validate the public origin.
/// Returns None and logs an error if validation fails.
pub fn validate_origin(origin: &str) -> Option<Url> {
    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => {
            error!(origin = %origin, error = %e, "Invalid origin URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = matches!(url.host_str(), Some("localhost" | "127.0.0.1"));

    if !is_https && !is_localhost {
        error!("origin must use HTTPS for non-localhost deployments");
        return None;
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    api_url: Url,
    origin: &Url,
    session_secret: String,
    request_timeout_secs: Option<u64>,
    trust_proxy: bool,
) -> ServerConfig {
    let secure_cookies = origin.scheme() == "https";

    ServerConfig {
        api_url,
        session_secret: session_secret.into_bytes(),
        secure_cookies,
        request_timeout: request_timeout_secs.map(Duration::from_secs),
        rate_limit: RateLimitConfig::new(trust_proxy),
    }
}
