//! Authenticated passthrough to the backend REST API.
//!
//! `GET|POST|PATCH|DELETE /api/{*resource}` is forwarded to
//! `{api_url}/{resource}` with the session's bearer token. The resource is
//! sent exactly as the client encoded it, and dot segments are refused so a
//! request cannot climb out of the API base path. Query strings are kept;
//! multipart bodies are re-encoded part by part.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Path, RawQuery, Request, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::AppState;
use super::error::ApiError;
use crate::gateway::{FormPart, ProtectedRequest, RequestBody};
use crate::session::Sessions;

const API_PREFIX: &str = "/api/";

/// Uploads (images, documents) may exceed axum's default body limit.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/{*resource}",
            get(forward).post(forward).patch(forward).delete(forward),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Resource path with its percent-encoding intact. `decoded` is the same
/// path after decoding; any `.` or `..` segment in it is rejected.
fn resource_path(raw_path: &str, decoded: &str) -> Result<String, ApiError> {
    if decoded.split('/').any(|segment| segment == "." || segment == "..") {
        warn!(path = %raw_path, "Rejected dot segment in passthrough path");
        return Err(ApiError::bad_request("Invalid resource path"));
    }

    raw_path
        .strip_prefix(API_PREFIX)
        .filter(|resource| !resource.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Invalid resource path"))
}

async fn read_parts(mut multipart: Multipart) -> Result<Vec<FormPart>, ApiError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?;
        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }
    Ok(parts)
}

async fn read_body(request: Request) -> Result<RequestBody, ApiError> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        return Ok(RequestBody::Multipart(read_parts(multipart).await?));
    }

    let bytes = Bytes::from_request(request, &())
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(RequestBody::Empty);
    }

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
    Ok(RequestBody::Json(value))
}

async fn forward(
    State(state): State<AppState>,
    Sessions(store): Sessions,
    Path(decoded): Path<String>,
    RawQuery(query): RawQuery,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let resource = resource_path(request.uri().path(), &decoded)?;
    let endpoint = match query {
        Some(query) if !query.is_empty() => format!("{}?{}", resource, query),
        _ => resource,
    };

    let mut protected = ProtectedRequest::new(request.method().clone(), endpoint);
    protected.body = read_body(request).await?;
    debug!(method = %protected.method, endpoint = %protected.endpoint, "Forwarding to backend");

    let data = state.gateway.execute(&*store, protected).await?;
    Ok(Json(data))
}
