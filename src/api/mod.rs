mod auth;
mod dashboard;
mod error;
mod form;
mod proxy;
mod validation;

use axum::Router;
use std::sync::Arc;

use crate::gateway::Gateway;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;
pub use form::{FieldErrors, FormState};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

/// Create the router for auth, dashboard and passthrough endpoints.
pub fn create_api_router(gateway: Gateway, rate_limit: Arc<RateLimitConfig>) -> Router {
    let state = AppState { gateway };

    Router::new()
        .merge(auth::router(state.clone(), rate_limit))
        .merge(dashboard::router(state.clone()))
        .merge(proxy::router(state))
}
