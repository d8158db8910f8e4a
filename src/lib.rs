pub mod api;
pub mod backend;
pub mod cli;
pub mod gateway;
pub mod listing;
pub mod rate_limit;
pub mod session;

use api::create_api_router;
use axum::{Router, middleware, response::Redirect, routing::get};
use backend::{BackendClient, build_http_client};
use gateway::Gateway;
use rate_limit::RateLimitConfig;
use session::{SessionConfig, SessionSigner, session_layer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub struct ServerConfig {
    /// Base URL of the backend REST API
    pub api_url: Url,
    /// Secret for signing session cookies
    pub session_secret: Vec<u8>,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Timeout for backend requests; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    pub rate_limit: RateLimitConfig,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Result<Router, reqwest::Error> {
    let http = build_http_client(config.request_timeout)?;
    let backend = BackendClient::new(&config.api_url, http);
    Ok(create_app_with_gateway(config, Gateway::new(backend)))
}

/// Create the application router around an existing gateway.
pub fn create_app_with_gateway(config: &ServerConfig, gateway: Gateway) -> Router {
    let sessions = SessionConfig {
        signer: Arc::new(SessionSigner::new(&config.session_secret)),
        secure_cookies: config.secure_cookies,
    };

    Router::new()
        .route("/", get(Redirect::temporary("/dashboard")))
        .merge(create_api_router(gateway, Arc::new(config.rate_limit.clone())))
        .layer(middleware::from_fn_with_state(sessions, session_layer))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config).map_err(std::io::Error::other)?;
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> std::io::Result<(tokio::task::JoinHandle<()>, SocketAddr)> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
