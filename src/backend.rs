//! Client for the external REST backend's unauthenticated endpoints.
//!
//! Sign-in, sign-up, logout and token refresh talk to `/auth/*` directly.
//! Everything that needs the session's access token goes through
//! [`crate::gateway::Gateway`] instead.

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::session::{Role, SessionUser};

/// Sign-up rejection shown for a 400 from the backend.
pub const USER_EXISTS_MESSAGE: &str = "The user is already existed!";

/// Sign-in form payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Sign-up form payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User as returned by `POST /auth/signin`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<BackendUser> for SessionUser {
    fn from(user: BackendUser) -> Self {
        SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            image: user.image,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInResponse {
    pub user: BackendUser,
    /// Absent when the backend accepted the credentials but issued no tokens
    #[serde(default)]
    pub tokens: Option<TokenPair>,
}

/// Body of `GET /auth/refresh`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Build the shared HTTP client. `None` leaves outbound calls without a timeout.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Human-readable message for a failed response: the JSON body's `message`
/// when there is one, otherwise the status line. Body read or parse errors
/// never replace the status.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    message_from_body(status, &body)
}

pub(crate) fn message_from_body(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            format!(
                "Error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        })
}

/// Clone is cheap - reqwest::Client shares its connection pool.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base: String,
}

impl BackendClient {
    pub fn new(base: &Url, http: Client) -> Self {
        Self {
            http,
            base: base.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Absolute URL for an endpoint relative to the backend base.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint.trim_start_matches('/'))
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SignInResponse, BackendError> {
        debug!(email = %credentials.email, "Signing in");
        let response = self
            .http
            .post(self.url("auth/signin"))
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(BackendError::Status { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("auth/signup"))
            .json(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = if status == StatusCode::BAD_REQUEST {
            USER_EXISTS_MESSAGE.to_string()
        } else {
            status.canonical_reason().unwrap_or("Sign up failed").to_string()
        };
        Err(BackendError::Status { status, message })
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .get(self.url("auth/logout"))
            .bearer_auth(access_token)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let message = error_message(response).await;
            Err(BackendError::Status { status, message })
        }
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, BackendError> {
        let response = self
            .http
            .get(self.url("auth/refresh"))
            .bearer_auth(refresh_token)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(BackendError::Status { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    /// Public read. Returns the body's `data` field, or the whole body when it
    /// has none.
    pub async fn fetch_data(&self, endpoint: &str) -> Result<Value, BackendError> {
        let url = self.url(endpoint);
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status,
                message: format!("Error {}: {}", status.as_u16(), text),
            });
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(match body.get_mut("data") {
            Some(data) => data.take(),
            None => body,
        })
    }
}
