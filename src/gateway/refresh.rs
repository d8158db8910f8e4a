//! Access token renewal.

use async_trait::async_trait;
use tracing::{debug, error};

use super::error::RefreshError;
use crate::backend::BackendClient;
use crate::session::SessionStore;

/// Mints a new access token for the session held in `store` and persists the
/// updated session there.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, store: &dyn SessionStore) -> Result<String, RefreshError>;
}

/// Refreshes through the backend's `GET /auth/refresh` endpoint.
pub struct BackendRefresher {
    backend: BackendClient,
}

impl BackendRefresher {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl TokenRefresher for BackendRefresher {
    async fn refresh(&self, store: &dyn SessionStore) -> Result<String, RefreshError> {
        let session = store
            .read()?
            .filter(|s| !s.refresh_token.is_empty())
            .ok_or(RefreshError::NoRefreshToken)?;

        let response = self
            .backend
            .refresh(&session.refresh_token)
            .await
            .inspect_err(|e| error!(error = %e, "Error refreshing token"))?;

        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(RefreshError::MissingAccessToken)?;

        store.save(&session.with_tokens(access_token.clone(), response.refresh_token))?;
        debug!(user = %session.user.id, "Session tokens refreshed");

        Ok(access_token)
    }
}
