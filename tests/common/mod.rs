#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bikebroker::ServerConfig;
use bikebroker::rate_limit::RateLimitConfig;
use bikebroker::session::{Role, Session, SessionSigner, SessionUser};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use url::Url;

pub const SESSION_SECRET: &[u8] = b"test-session-secret-that-is-long-enough";

pub const VALID_PASSWORD: &str = "correct-horse";

/// A request received by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    /// Path and query string
    pub uri: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    refresh_fails: Arc<AtomicBool>,
}

/// Stand-in for the REST backend, served on an ephemeral local port.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: MockState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = MockState::default();

        let app = Router::new()
            .route("/auth/signin", post(sign_in))
            .route("/auth/signup", post(sign_up))
            .route("/auth/logout", get(logout))
            .route("/auth/refresh", get(refresh))
            .route("/users", get(users).post(create_user))
            .route(
                "/users/{id}",
                get(user_by_id).patch(update_user).delete(delete_user),
            )
            .route("/user-activity", get(user_activity))
            .route("/user-activity/{id}", get(user_activity_by_id))
            .route("/uploads", post(uploads))
            .route("/bike-information", get(bike_information))
            .route("/bike-information/{id}", delete(delete_bike))
            .route("/forbidden", get(forbidden))
            .route("/broken", get(broken))
            .route("/plain-error", get(plain_error))
            .route("/always-unauthorized", get(always_unauthorized))
            .route("/forbidden-after-refresh", get(forbidden_after_refresh))
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Invalid mock URL")
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Calls whose path starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.uri.starts_with(prefix))
            .collect()
    }

    pub fn fail_refresh(&self) {
        self.state.refresh_fails.store(true, Ordering::SeqCst);
    }
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let call = {
        let header_value = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedCall {
            method: request.method().to_string(),
            uri: request
                .uri()
                .path_and_query()
                .map(|pq| pq.to_string())
                .unwrap_or_default(),
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
        }
    };
    state.calls.lock().unwrap().push(call);
    next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "jwt expired" })),
    )
        .into_response()
}

fn backend_user(email: &str) -> Value {
    json!({ "_id": "u1", "name": "Rahim", "email": email, "role": "admin" })
}

async fn sign_in(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if password != VALID_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response();
    }

    if email == "no-tokens@example.com" {
        return Json(json!({ "user": backend_user(email) })).into_response();
    }

    Json(json!({
        "user": backend_user(email),
        "tokens": { "accessToken": "a1", "refreshToken": "r1" }
    }))
    .into_response()
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "duplicate key" })),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn logout(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(_) => Json(json!({ "success": true })).into_response(),
        None => unauthorized(),
    }
}

async fn refresh(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if state.refresh_fails.load(Ordering::SeqCst) || bearer(&headers) != Some("r1") {
        return unauthorized();
    }
    Json(json!({ "accessToken": "a2" })).into_response()
}

/// Only accepts the refreshed token, so `a1` always triggers a refresh.
async fn users(headers: HeaderMap) -> Response {
    if bearer(&headers) != Some("a2") {
        return unauthorized();
    }
    Json(json!({
        "data": [
            { "_id": "u1", "name": "Rahim", "email": "rahim@example.com" },
            { "_id": "u2", "name": "Karim", "email": "karim@dealer.com" }
        ]
    }))
    .into_response()
}

/// Echoes the submitted record so callers can check what arrived.
async fn create_user(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(json!({ "created": body }))).into_response()
}

async fn user_by_id(Path(id): Path<String>) -> Response {
    Json(json!({ "data": { "_id": id, "createdAt": "2024-01-15T10:00:00.000Z" } })).into_response()
}

async fn update_user(
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({ "id": id, "updated": body })).into_response()
}

async fn delete_user(Path(_id): Path<String>) -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Two sign-ins in 2025 plus one action stamped with the current time.
async fn user_activity_by_id(Path(_id): Path<String>) -> Response {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    Json(json!({
        "data": [
            { "action": "Sign In", "createdAt": "2025-03-10T08:00:00.000Z" },
            { "action": "Sign In", "createdAt": "2025-03-11T08:00:00.000Z" },
            { "action": "Updated bike", "createdAt": now }
        ]
    }))
    .into_response()
}

async fn user_activity(headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "data": [
            { "action": "User login", "createdAt": "2025-03-11T06:00:00Z" },
            { "action": "Deleted bike record", "createdAt": "2025-03-11T07:00:00Z" }
        ],
        "total": 2
    }))
    .into_response()
}

async fn uploads(headers: HeaderMap, mut multipart: Multipart) -> Response {
    if bearer(&headers) != Some("a2") {
        return unauthorized();
    }
    let mut names = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        names.push(field.name().unwrap_or_default().to_string());
        let _ = field.bytes().await;
    }
    Json(json!({ "parts": names })).into_response()
}

async fn bike_information() -> Response {
    Json(json!({
        "data": [
            { "bikeBrand": "honda", "manufacturingYear": 2021, "engineNumber": "HE-1001", "chassisNumber": "CH-77" },
            { "bikeBrand": "yamaha", "manufacturingYear": 2019, "engineNumber": "YM-2002", "chassisNumber": "CH-88" },
            { "bikeBrand": "honda", "manufacturingYear": 2019, "engineNumber": "HE-3003", "chassisNumber": "XZ-99" }
        ]
    }))
    .into_response()
}

async fn delete_bike(Path(_id): Path<String>) -> Response {
    StatusCode::NO_CONTENT.into_response()
}

async fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": "Admins only" })),
    )
        .into_response()
}

async fn broken() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Database unavailable" })),
    )
        .into_response()
}

async fn plain_error() -> Response {
    (StatusCode::BAD_GATEWAY, "upstream down").into_response()
}

async fn always_unauthorized() -> Response {
    unauthorized()
}

/// Rejects the stale token, then refuses the refreshed one.
async fn forbidden_after_refresh(headers: HeaderMap) -> Response {
    if bearer(&headers) != Some("a2") {
        return unauthorized();
    }
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "message": "Admins only" })),
    )
        .into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Not found" })),
    )
        .into_response()
}

/// Server configuration pointing at `api_url`, with client IPs taken from
/// `X-Forwarded-For`.
pub fn test_config(api_url: Url) -> ServerConfig {
    ServerConfig {
        api_url,
        session_secret: SESSION_SECRET.to_vec(),
        secure_cookies: false,
        request_timeout: Some(Duration::from_secs(5)),
        rate_limit: RateLimitConfig::new(true),
    }
}

pub fn test_session(access_token: &str) -> Session {
    Session {
        user: SessionUser {
            id: "u1".to_string(),
            name: "Rahim".to_string(),
            email: "rahim@example.com".to_string(),
            role: Role::Admin,
            image: None,
        },
        access_token: access_token.to_string(),
        refresh_token: "r1".to_string(),
    }
}

/// `Cookie` header value carrying a signed session.
pub fn session_cookie_header(session: &Session) -> String {
    let signed = SessionSigner::new(SESSION_SECRET)
        .sign(session)
        .expect("Failed to sign session");
    format!("session={}", signed.token)
}

/// Extract all Set-Cookie headers from a response.
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// The `session` cookie value set by a response, if any.
pub fn session_token(response: &Response<Body>) -> Option<String> {
    extract_set_cookies(response).into_iter().find_map(|c| {
        c.split(';')
            .next()?
            .strip_prefix("session=")
            .map(str::to_string)
    })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
