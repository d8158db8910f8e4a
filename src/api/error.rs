//! Shared error handling for dashboard and passthrough endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::backend::BackendError;
use crate::gateway::{FORBIDDEN_MESSAGE, GatewayError, SESSION_EXPIRED_MESSAGE};
use crate::session::SessionRejection;

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// Non-OK answer from the backend, passed on with its status
    Upstream { status: StatusCode, message: String },
    BadGateway(String),
    /// Session missing or unusable; answered with the sign-in redirect
    SignInRequired(SessionRejection),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn bad_gateway(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::BadGateway(context.into())
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Session(rejection) => Self::SignInRequired(rejection),
            GatewayError::SessionExpired => Self::Unauthorized(SESSION_EXPIRED_MESSAGE.into()),
            GatewayError::Forbidden => Self::Forbidden(FORBIDDEN_MESSAGE.into()),
            GatewayError::Backend { status, message } => Self::Upstream { status, message },
            GatewayError::Transport(e) => Self::bad_gateway("Backend request failed", e),
            GatewayError::InvalidResponse(e) => Self::bad_gateway("Invalid backend response", e),
            GatewayError::InvalidToken => {
                error!("Session holds an unusable access token");
                Self::Unauthorized(SESSION_EXPIRED_MESSAGE.into())
            }
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Status { status, message } => Self::Upstream { status, message },
            BackendError::Transport(e) => Self::bad_gateway("Backend request failed", e),
            BackendError::InvalidResponse(e) => Self::bad_gateway("Invalid backend response", e),
        }
    }
}

impl From<SessionRejection> for ApiError {
    fn from(rejection: SessionRejection) -> Self {
        Self::SignInRequired(rejection)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::SignInRequired(rejection) => return rejection.into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Upstream { status, message } => (status, message),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
