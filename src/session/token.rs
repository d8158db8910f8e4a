//! Signing and verification of the session cookie value.
//!
//! The whole [`Session`] is embedded in an HS256 JWT together with `iat` and
//! `exp`, so verification needs nothing but the server secret.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::types::Session;

/// Session lifetime: 24 hours from issuance.
pub const SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    session: Session,
    /// Issued at (Unix timestamp)
    iat: u64,
    /// Expiration time (Unix timestamp)
    exp: u64,
}

/// Result of signing a session.
#[derive(Debug, Clone)]
pub struct SignedSession {
    /// The JWT placed in the cookie
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Lifetime in seconds
    pub duration: u64,
}

/// Holds the keys derived from `SESSION_SECRET_KEY`.
#[derive(Clone)]
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a session that expires 24 hours from now.
    pub fn sign(&self, session: &Session) -> Result<SignedSession, SessionTokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| SessionTokenError::TimeError)?
            .as_secs();
        self.sign_at(session, now)
    }

    /// Sign a session as if it were issued at `issued_at`.
    pub fn sign_at(
        &self,
        session: &Session,
        issued_at: u64,
    ) -> Result<SignedSession, SessionTokenError> {
        let exp = issued_at + SESSION_DURATION_SECS;
        let claims = SessionClaims {
            session: session.clone(),
            iat: issued_at,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(SessionTokenError::Encoding)?;

        Ok(SignedSession {
            token,
            expires_at: exp,
            duration: SESSION_DURATION_SECS,
        })
    }

    /// Verify signature and expiry, returning the embedded session.
    pub fn verify(&self, token: &str) -> Result<Session, SessionTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(SessionTokenError::Decoding)?;

        Ok(data.claims.session)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("Failed to sign session: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("Failed to verify session: {0}")]
    Decoding(#[source] jsonwebtoken::errors::Error),
    #[error("System time error")]
    TimeError,
}
