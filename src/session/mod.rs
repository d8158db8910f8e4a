//! Signed cookie sessions.
//!
//! A session bundles the staff member's identity with the backend access and
//! refresh tokens. It lives entirely in the `session` cookie as an HS256 JWT
//! valid for 24 hours; the server keeps no session state of its own.

mod cookie;
mod extractors;
mod store;
mod token;
mod types;

pub use cookie::{SESSION_COOKIE_NAME, clear_session_cookie, get_cookie, session_cookie};
pub use extractors::{SessionConfig, Sessions, SignedIn, session_layer};
pub use store::{
    CookieSessionStore, MemorySessionStore, SIGN_IN_PATH, SessionError, SessionRejection,
    SessionStore,
};
pub use token::{SESSION_DURATION_SECS, SessionSigner, SessionTokenError, SignedSession};
pub use types::{Role, Session, SessionUser};
