//! Form input extraction and the form result payload.

use std::collections::BTreeMap;

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

/// Field name to validation messages.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

/// Accepts a body either as `application/json` or as an HTML form post.
pub struct FormOrJson<T>(pub T);

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

/// Outcome of a form submission that did not redirect.
#[derive(Debug, Default, Serialize)]
pub struct FormState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl FormState {
    pub fn invalid(errors: FieldErrors) -> Response {
        let state = FormState {
            errors: Some(errors),
            ..Default::default()
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(state)).into_response()
    }

    pub fn failed(status: StatusCode, message: impl Into<String>) -> Response {
        let state = FormState {
            message: Some(message.into()),
            ..Default::default()
        };
        (status, Json(state)).into_response()
    }

    pub fn succeeded(message: impl Into<String>) -> Response {
        let state = FormState {
            message: Some(message.into()),
            success: Some(true),
            ..Default::default()
        };
        (StatusCode::OK, Json(state)).into_response()
    }
}
