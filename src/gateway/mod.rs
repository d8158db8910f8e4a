//! Protected request gateway.
//!
//! Every authenticated call to the backend goes through [`Gateway::execute`]:
//! the session's access token is attached as a bearer token, and a 401 on the
//! first attempt triggers exactly one refresh-and-retry. A failed refresh
//! deletes the session. A 403 is final and leaves the session alone.

mod error;
mod refresh;
mod request;

pub use error::{FORBIDDEN_MESSAGE, GatewayError, RefreshError, SESSION_EXPIRED_MESSAGE};
pub use refresh::{BackendRefresher, TokenRefresher};
pub use request::{FormPart, ProtectedRequest, RequestBody};

use std::sync::Arc;

use reqwest::{
    Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendClient, error_message};
use crate::session::SessionStore;

/// State of one logical request across its (at most two) attempts.
struct Attempt {
    access_token: String,
    retried: bool,
}

#[derive(Clone)]
pub struct Gateway {
    backend: BackendClient,
    refresher: Arc<dyn TokenRefresher>,
}

impl Gateway {
    /// Gateway refreshing through the backend's `/auth/refresh`.
    pub fn new(backend: BackendClient) -> Self {
        let refresher = Arc::new(BackendRefresher::new(backend.clone()));
        Self { backend, refresher }
    }

    pub fn with_refresher(backend: BackendClient, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self { backend, refresher }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    fn build_headers(request: &ProtectedRequest, access_token: &str) -> Result<HeaderMap, GatewayError> {
        let mut headers = request.headers.clone();

        let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| GatewayError::InvalidToken)?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Multipart bodies carry their own boundary in the content type
        if request.body.is_multipart() {
            headers.remove(CONTENT_TYPE);
        } else {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }

    async fn send(
        &self,
        request: &ProtectedRequest,
        access_token: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        let headers = Self::build_headers(request, access_token)?;
        let builder = self
            .backend
            .http()
            .request(request.method.clone(), self.backend.url(&request.endpoint))
            .headers(headers);

        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(RequestBody::to_form(parts)?),
        };

        Ok(builder.send().await?)
    }

    /// Execute a request with the session's access token, refreshing it once
    /// on a 401.
    pub async fn execute(
        &self,
        store: &dyn SessionStore,
        request: ProtectedRequest,
    ) -> Result<Value, GatewayError> {
        let access_token = store
            .read()?
            .map(|session| session.access_token)
            .unwrap_or_default();

        let mut attempt = Attempt {
            access_token,
            retried: false,
        };

        loop {
            let response = self.send(&request, &attempt.access_token).await?;
            let status = response.status();

            match status {
                StatusCode::UNAUTHORIZED if !attempt.retried => {
                    info!(endpoint = %request.endpoint, "Access token expired. Refreshing...");
                    match self.refresher.refresh(store).await {
                        Ok(access_token) => {
                            attempt = Attempt {
                                access_token,
                                retried: true,
                            };
                        }
                        Err(e) => {
                            warn!(error = %e, "Token refresh failed, ending session");
                            if let Err(e) = store.delete() {
                                error!(error = %e, "Failed to delete session");
                            }
                            return Err(GatewayError::SessionExpired);
                        }
                    }
                }
                StatusCode::FORBIDDEN if !attempt.retried => {
                    return Err(GatewayError::Forbidden);
                }
                status if !status.is_success() => {
                    let message = error_message(response).await;
                    warn!(endpoint = %request.endpoint, status = %status, message = %message, "Backend request failed");
                    return Err(GatewayError::Backend { status, message });
                }
                _ => return Self::parse_body(response).await,
            }
        }
    }

    async fn parse_body(response: reqwest::Response) -> Result<Value, GatewayError> {
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        let data: Value = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        debug!(data = %data, "Backend response");
        Ok(data)
    }

    pub async fn get(&self, store: &dyn SessionStore, endpoint: &str) -> Result<Value, GatewayError> {
        self.execute(store, ProtectedRequest::get(endpoint)).await
    }

    pub async fn post_json(
        &self,
        store: &dyn SessionStore,
        endpoint: &str,
        values: Value,
    ) -> Result<Value, GatewayError> {
        self.execute(store, ProtectedRequest::new(Method::POST, endpoint).json(values))
            .await
    }

    pub async fn patch_json(
        &self,
        store: &dyn SessionStore,
        endpoint: &str,
        id: &str,
        values: Value,
    ) -> Result<Value, GatewayError> {
        let endpoint = format!("{}/{}", endpoint, id);
        self.execute(store, ProtectedRequest::new(Method::PATCH, endpoint).json(values))
            .await
    }

    pub async fn delete_by_id(
        &self,
        store: &dyn SessionStore,
        endpoint: &str,
        id: &str,
    ) -> Result<Value, GatewayError> {
        let endpoint = format!("{}/{}", endpoint, id);
        self.execute(store, ProtectedRequest::new(Method::DELETE, endpoint))
            .await
    }

    pub async fn post_form(
        &self,
        store: &dyn SessionStore,
        endpoint: &str,
        parts: Vec<FormPart>,
    ) -> Result<Value, GatewayError> {
        self.execute(store, ProtectedRequest::new(Method::POST, endpoint).multipart(parts))
            .await
    }
}
