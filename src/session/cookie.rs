//! Cookie header parsing and `Set-Cookie` construction for the session.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};

use super::token::SignedSession;

/// Cookie name holding the signed session.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

fn http_date(unix_secs: u64) -> Option<String> {
    let date = DateTime::<Utc>::from_timestamp(i64::try_from(unix_secs).ok()?, 0)?;
    Some(date.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

/// `Set-Cookie` value storing a freshly signed session.
pub fn session_cookie(signed: &SignedSession, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    let expires = http_date(signed.expires_at)
        .map(|d| format!("; Expires={}", d))
        .unwrap_or_default();
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}{}",
        SESSION_COOKIE_NAME, signed.token, signed.duration, expires, secure
    )
}

/// `Set-Cookie` value removing the session.
pub fn clear_session_cookie(secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT{}",
        SESSION_COOKIE_NAME, secure
    )
}
