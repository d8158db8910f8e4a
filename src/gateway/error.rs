//! Gateway failures.

use reqwest::StatusCode;

use crate::backend::BackendError;
use crate::session::{SessionError, SessionRejection};

/// Message shown when the session could not be renewed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please sign in again.";

/// Message shown for a 403 from the backend.
pub const FORBIDDEN_MESSAGE: &str = "You do not have the necessary permissions";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The stored session failed verification and has been deleted.
    #[error(transparent)]
    Session(#[from] SessionRejection),
    /// Access token expired and the refresh flow failed.
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    #[error("{}", FORBIDDEN_MESSAGE)]
    Forbidden,
    /// Non-OK response after at most one retry.
    #[error("{message}")]
    Backend { status: StatusCode, message: String },
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The session's access token cannot be sent as a header value.
    #[error("Stored access token is not a valid header value")]
    InvalidToken,
}

/// Why a token refresh failed. Every variant ends the session.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("No refresh token available.")]
    NoRefreshToken,
    #[error("Failed to refresh token: {0}")]
    Backend(#[from] BackendError),
    #[error("No access token returned from refresh.")]
    MissingAccessToken,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Rejected(#[from] SessionRejection),
}
