//! Session repository: the read/create/delete/save operations over the
//! signed `session` cookie.

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

use super::cookie::{SESSION_COOKIE_NAME, clear_session_cookie, get_cookie, session_cookie};
use super::token::{SessionSigner, SessionTokenError};
use super::types::Session;

/// Where callers are sent when their session is missing or unusable.
pub const SIGN_IN_PATH: &str = "/auth/signin";

/// Storage for the current authentication state.
///
/// Implementations are scoped to a single request. Reads are local and
/// synchronous; nothing here performs network I/O.
pub trait SessionStore: Send + Sync {
    /// Returns `Ok(None)` when signed out. A session that fails verification
    /// is deleted and reported as a [`SessionRejection`].
    fn read(&self) -> Result<Option<Session>, SessionRejection>;

    /// Sign and store a session, replacing any existing one.
    fn create(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the stored session.
    fn delete(&self) -> Result<(), SessionError>;

    /// Persist a session mutated by the refresh flow.
    fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.create(session).map_err(|e| {
            error!(error = %e, "Failed to save session");
            SessionError::Save
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Refusing to store a partially populated session")]
    Incomplete,
    #[error(transparent)]
    Signing(#[from] SessionTokenError),
    #[error("Could not delete session")]
    Storage,
    #[error("Unable to save session")]
    Save,
}

/// The session cookie is absent, forged or expired. Answered with a redirect
/// to the sign-in page.
#[derive(Debug)]
pub struct SessionRejection {
    invalid: bool,
}

impl SessionRejection {
    pub fn missing() -> Self {
        Self { invalid: false }
    }

    pub fn invalid() -> Self {
        Self { invalid: true }
    }

    /// True when a cookie was present but failed verification.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }
}

impl std::fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.invalid {
            write!(f, "Session is invalid or expired")
        } else {
            write!(f, "Not signed in")
        }
    }
}

impl std::error::Error for SessionRejection {}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        Redirect::temporary(SIGN_IN_PATH).into_response()
    }
}

#[derive(Default)]
struct CookieState {
    /// Cookie value as seen by this request, updated by our own writes
    current: Option<String>,
    /// Last `Set-Cookie` value to send back
    pending: Option<String>,
}

/// Cookie-backed store for one request.
///
/// Built from the incoming `Cookie` header; writes are queued and emitted as
/// a single `Set-Cookie` header on the response.
pub struct CookieSessionStore {
    signer: Arc<SessionSigner>,
    secure: bool,
    state: Mutex<CookieState>,
}

impl CookieSessionStore {
    pub fn from_headers(headers: &HeaderMap, signer: Arc<SessionSigner>, secure: bool) -> Self {
        let current = get_cookie(headers, SESSION_COOKIE_NAME)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self {
            signer,
            secure,
            state: Mutex::new(CookieState {
                current,
                pending: None,
            }),
        }
    }

    /// Take the queued `Set-Cookie` value, if the session changed.
    pub fn take_set_cookie(&self) -> Option<String> {
        self.state.lock().ok()?.pending.take()
    }
}

impl SessionStore for CookieSessionStore {
    fn read(&self) -> Result<Option<Session>, SessionRejection> {
        let token = match self.state.lock() {
            Ok(state) => state.current.clone(),
            Err(_) => return Err(SessionRejection::invalid()),
        };
        let Some(token) = token else {
            return Ok(None);
        };

        match self.signer.verify(&token) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "Failed to verify the session");
                if let Err(e) = self.delete() {
                    error!(error = %e, "Failed to delete session");
                }
                Err(SessionRejection::invalid())
            }
        }
    }

    fn create(&self, session: &Session) -> Result<(), SessionError> {
        if !session.is_complete() {
            return Err(SessionError::Incomplete);
        }
        let signed = self.signer.sign(session)?;
        let cookie = session_cookie(&signed, self.secure);

        let mut state = self.state.lock().map_err(|_| SessionError::Storage)?;
        state.current = Some(signed.token);
        state.pending = Some(cookie);
        Ok(())
    }

    fn delete(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().map_err(|_| {
            error!("Failed to delete session: cookie state poisoned");
            SessionError::Storage
        })?;
        state.current = None;
        state.pending = Some(clear_session_cookie(self.secure));
        Ok(())
    }
}

/// In-process store holding a decoded session. Used by tests and by callers
/// that keep sessions outside of cookies.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Snapshot of the stored session.
    pub fn current(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|s| s.clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Result<Option<Session>, SessionRejection> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|_| SessionRejection::invalid())
    }

    fn create(&self, session: &Session) -> Result<(), SessionError> {
        if !session.is_complete() {
            return Err(SessionError::Incomplete);
        }
        *self.session.lock().map_err(|_| SessionError::Storage)? = Some(session.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), SessionError> {
        *self.session.lock().map_err(|_| SessionError::Storage)? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::sample_session;
    use axum::http::{HeaderValue, StatusCode, header};

    fn signer() -> Arc<SessionSigner> {
        Arc::new(SessionSigner::new(b"test-secret-key-for-testing"))
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_read_without_cookie() {
        let store = CookieSessionStore::from_headers(&HeaderMap::new(), signer(), false);
        assert!(store.read().unwrap().is_none());
        assert!(store.take_set_cookie().is_none());
    }

    #[test]
    fn test_save_then_read_round_trip() {
        let store = CookieSessionStore::from_headers(&HeaderMap::new(), signer(), false);
        let session = sample_session();

        store.save(&session).unwrap();
        let read = store.read().unwrap().unwrap();
        assert_eq!(read.user, session.user);
        assert_eq!(read.access_token, session.access_token);
        assert_eq!(read.refresh_token, session.refresh_token);

        let cookie = store.take_set_cookie().unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_read_existing_cookie() {
        let signer = signer();
        let signed = signer.sign(&sample_session()).unwrap();
        let headers = headers_with(&format!("session={}", signed.token));

        let store = CookieSessionStore::from_headers(&headers, signer, false);
        assert_eq!(store.read().unwrap(), Some(sample_session()));
        assert!(store.take_set_cookie().is_none());
    }

    #[test]
    fn test_tampered_cookie_is_deleted() {
        let headers = headers_with("session=forged.token.value");
        let store = CookieSessionStore::from_headers(&headers, signer(), false);

        let rejection = store.read().unwrap_err();
        assert!(rejection.is_invalid());

        let cookie = store.take_set_cookie().unwrap();
        assert!(cookie.contains("Max-Age=0"));

        // Deleted for the rest of the request
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_rejection_redirects_to_sign_in() {
        let response = SessionRejection::invalid().into_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], SIGN_IN_PATH);
    }

    #[test]
    fn test_incomplete_session_not_persisted() {
        let store = CookieSessionStore::from_headers(&HeaderMap::new(), signer(), false);
        let mut session = sample_session();
        session.access_token.clear();

        assert!(matches!(store.create(&session), Err(SessionError::Incomplete)));
        assert!(store.take_set_cookie().is_none());
        assert!(store.read().unwrap().is_none());

        assert!(matches!(store.save(&session), Err(SessionError::Save)));
    }

    #[test]
    fn test_delete_queues_clearing_cookie() {
        let signer = signer();
        let signed = signer.sign(&sample_session()).unwrap();
        let headers = headers_with(&format!("session={}", signed.token));
        let store = CookieSessionStore::from_headers(&headers, signer, true);

        store.delete().unwrap();
        assert!(store.read().unwrap().is_none());
        let cookie = store.take_set_cookie().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new(None);
        assert!(store.read().unwrap().is_none());

        store.create(&sample_session()).unwrap();
        assert_eq!(store.current(), Some(sample_session()));

        store.delete().unwrap();
        assert!(store.current().is_none());
    }
}
