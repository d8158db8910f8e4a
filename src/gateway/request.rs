//! Description of one protected backend call.

use reqwest::{Method, header::HeaderMap, multipart};
use serde_json::Value;

/// One part of a multipart upload, kept as owned bytes so the form can be
/// rebuilt for a retry.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// Fresh reqwest form for one attempt.
    pub(crate) fn to_form(parts: &[FormPart]) -> Result<multipart::Form, reqwest::Error> {
        let mut form = multipart::Form::new();
        for part in parts {
            let mut p = multipart::Part::bytes(part.data.clone());
            if let Some(ref file_name) = part.file_name {
                p = p.file_name(file_name.clone());
            }
            if let Some(ref content_type) = part.content_type {
                p = p.mime_str(content_type)?;
            }
            form = form.part(part.name.clone(), p);
        }
        Ok(form)
    }
}

/// A call to `{api_url}/{endpoint}` made with the session's access token.
#[derive(Debug, Clone)]
pub struct ProtectedRequest {
    pub method: Method,
    /// Path relative to the backend base, may include a query string
    pub endpoint: String,
    pub body: RequestBody,
    /// Extra headers; the gateway's own headers take precedence
    pub headers: HeaderMap,
}

impl ProtectedRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}
