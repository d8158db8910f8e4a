//! Middleware and axum extractors that hand the per-request session store to
//! handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};

use super::store::{CookieSessionStore, SessionRejection, SessionStore};
use super::token::SessionSigner;
use super::types::Session;

/// Settings shared by every request's session store.
#[derive(Clone)]
pub struct SessionConfig {
    pub signer: Arc<SessionSigner>,
    /// Set the `Secure` cookie attribute (HTTPS deployments)
    pub secure_cookies: bool,
}

/// Middleware installing a [`CookieSessionStore`] for the request and
/// writing back any session change as a `Set-Cookie` header.
pub async fn session_layer(
    State(config): State<SessionConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let store = Arc::new(CookieSessionStore::from_headers(
        request.headers(),
        config.signer.clone(),
        config.secure_cookies,
    ));
    request.extensions_mut().insert(store.clone());

    let mut response = next.run(request).await;

    if let Some(cookie) = store.take_set_cookie() {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}

/// The request's session store.
pub struct Sessions(pub Arc<CookieSessionStore>);

impl<S> FromRequestParts<S> for Sessions
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<CookieSessionStore>>()
            .cloned()
            .map(Sessions)
            .ok_or_else(|| {
                tracing::error!("Session layer is not installed on this route");
                SessionRejection::missing()
            })
    }
}

/// Extractor for pages that require a signed-in user.
/// Redirects to sign-in when the session is absent or fails verification.
pub struct SignedIn {
    pub session: Session,
    pub store: Arc<CookieSessionStore>,
}

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Sessions(store) = Sessions::from_request_parts(parts, state).await?;
        let session = store.read()?.ok_or_else(SessionRejection::missing)?;
        Ok(SignedIn { session, store })
    }
}
