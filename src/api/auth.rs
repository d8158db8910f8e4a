//! Sign-in, sign-up and session endpoints.
//!
//! - POST `/auth/signin` - Exchange credentials for a session cookie
//! - POST `/auth/signup` - Register a new account
//! - POST `/auth/signout` - Log out at the backend and drop the session
//! - POST `/auth/forgot-password` - Validate a password reset request
//! - GET `/auth/session` - Current session user, if any

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};

use super::form::{FormOrJson, FormState};
use super::validation::{self, ForgotPasswordInput, SignInInput, SignUpInput};
use super::AppState;
use crate::backend::{BackendError, SignInResponse};
use crate::rate_limit::{RateLimitConfig, rate_limit_sign_in, rate_limit_sign_up};
use crate::session::{SIGN_IN_PATH, Session, SessionRejection, SessionStore, SessionUser, Sessions};

const DASHBOARD_PATH: &str = "/dashboard";

const RESET_LINK_SENT: &str = "A password reset link has been sent to your email.";

pub fn router(state: AppState, rate_limit: Arc<RateLimitConfig>) -> Router {
    let sign_in_route = Router::new()
        .route("/auth/signin", post(sign_in))
        .layer(middleware::from_fn_with_state(rate_limit.clone(), rate_limit_sign_in));

    let sign_up_route = Router::new()
        .route("/auth/signup", post(sign_up))
        .layer(middleware::from_fn_with_state(rate_limit, rate_limit_sign_up));

    Router::new()
        .route("/auth/signout", post(sign_out))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/session", get(current_session))
        .merge(sign_in_route)
        .merge(sign_up_route)
        .with_state(state)
}

/// Status for a rejected form submission: backend client errors keep the
/// given status, anything else is reported as a gateway failure.
fn rejection_status(status: StatusCode, client_error: StatusCode) -> StatusCode {
    if status.is_client_error() {
        client_error
    } else {
        StatusCode::BAD_GATEWAY
    }
}

async fn sign_in(
    State(state): State<AppState>,
    Sessions(store): Sessions,
    FormOrJson(input): FormOrJson<SignInInput>,
) -> Response {
    let credentials = match validation::sign_in(&input) {
        Ok(credentials) => credentials,
        Err(errors) => return FormState::invalid(errors),
    };

    let (user, tokens) = match state.gateway.backend().sign_in(&credentials).await {
        Ok(SignInResponse {
            user,
            tokens: Some(tokens),
        }) => (user, tokens),
        Ok(SignInResponse { tokens: None, .. }) => {
            error!("Sign-in response did not include tokens");
            return FormState::failed(StatusCode::BAD_GATEWAY, "Invalid response from server.");
        }
        Err(BackendError::Status { status, message }) => {
            warn!(status = %status, "Sign-in rejected by backend");
            return FormState::failed(rejection_status(status, StatusCode::UNAUTHORIZED), message);
        }
        Err(e) => {
            error!("Sign-in request failed: {}", e);
            return FormState::failed(StatusCode::BAD_GATEWAY, "Unable to reach the server.");
        }
    };

    let session = Session {
        user: user.into(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    };

    if let Err(e) = store.create(&session) {
        error!("Failed to create session: {}", e);
        return FormState::failed(StatusCode::BAD_GATEWAY, "Unable to start a session.");
    }

    info!(user_id = %session.user.id, "User signed in");
    Redirect::to(DASHBOARD_PATH).into_response()
}

async fn sign_up(
    State(state): State<AppState>,
    FormOrJson(input): FormOrJson<SignUpInput>,
) -> Response {
    let form = match validation::sign_up(&input) {
        Ok(form) => form,
        Err(errors) => return FormState::invalid(errors),
    };

    match state.gateway.backend().sign_up(&form).await {
        Ok(()) => {
            info!("New account registered");
            Redirect::to(SIGN_IN_PATH).into_response()
        }
        Err(BackendError::Status { status, message }) => {
            warn!(status = %status, "Sign-up rejected by backend");
            FormState::failed(rejection_status(status, StatusCode::BAD_REQUEST), message)
        }
        Err(e) => {
            error!("Sign-up request failed: {}", e);
            FormState::failed(StatusCode::BAD_GATEWAY, "Unable to reach the server.")
        }
    }
}

async fn sign_out(State(state): State<AppState>, Sessions(store): Sessions) -> Response {
    let session = match store.read() {
        Ok(Some(session)) => session,
        Ok(None) => {
            warn!("Sign-out without a session");
            return Redirect::to(SIGN_IN_PATH).into_response();
        }
        // Invalid cookie is already cleared by the store
        Err(_) => return Redirect::to(SIGN_IN_PATH).into_response(),
    };

    match state.gateway.backend().logout(&session.access_token).await {
        Ok(()) => {
            if let Err(e) = store.delete() {
                error!("Failed to delete session: {}", e);
            } else {
                info!(user_id = %session.user.id, "User signed out");
            }
        }
        Err(e) => error!("Backend logout failed: {}", e),
    }

    Redirect::to(SIGN_IN_PATH).into_response()
}

async fn forgot_password(FormOrJson(input): FormOrJson<ForgotPasswordInput>) -> Response {
    match validation::forgot_password(&input) {
        Ok(_email) => FormState::succeeded(RESET_LINK_SENT),
        Err(errors) => FormState::invalid(errors),
    }
}

#[derive(Serialize)]
struct SessionResponse {
    user: Option<SessionUser>,
}

async fn current_session(Sessions(store): Sessions) -> Result<impl IntoResponse, SessionRejection> {
    let user = store.read()?.map(|session| session.user);
    Ok(Json(SessionResponse { user }))
}
