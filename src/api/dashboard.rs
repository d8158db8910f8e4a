//! Dashboard data endpoints. All require a signed-in user.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::form_urlencoded;

use super::AppState;
use super::error::ApiError;
use crate::listing::{
    BRANDS, BikeFilter, DateRangeFilter, SidebarItem, UserStatistics, annotate_activities,
    bike_page, parse_positive, records, search_users, sidebar_for, user_statistics,
};
use crate::session::{SessionUser, SignedIn};

const BIKES_ENDPOINT: &str = "bike-information";
const ACTIVITY_ENDPOINT: &str = "user-activity";
const USERS_ENDPOINT: &str = "users";

const DEFAULT_ACTIVITY_LIMIT: u32 = 10;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(overview))
        .route("/dashboard/bikes", get(bikes))
        .route("/dashboard/activity", get(activity))
        .route("/dashboard/brands", get(brands))
        .route("/dashboard/users", get(users).post(create_user))
        .route("/dashboard/users/{id}", patch(update_user).delete(delete_user))
        .route("/dashboard/users/{id}/statistics", get(user_stats))
        .with_state(state)
}

#[derive(Serialize)]
struct OverviewResponse {
    user: SessionUser,
    menu: Vec<SidebarItem>,
}

async fn overview(SignedIn { session, .. }: SignedIn) -> impl IntoResponse {
    let menu = sidebar_for(session.user.role);
    Json(OverviewResponse {
        user: session.user,
        menu,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BikeQuery {
    brand: Option<String>,
    year: Option<String>,
    q: Option<String>,
    range: Option<String>,
    page: Option<String>,
}

impl BikeQuery {
    fn filter(&self) -> BikeFilter {
        BikeFilter {
            brand: self.brand.clone().filter(|b| !b.is_empty()),
            year: self.year.as_deref().and_then(|y| y.trim().parse().ok()),
            search: self.q.clone().filter(|q| !q.trim().is_empty()),
            range: self
                .range
                .as_deref()
                .map(DateRangeFilter::parse)
                .unwrap_or_default(),
        }
    }
}

async fn bikes(
    State(state): State<AppState>,
    _signed_in: SignedIn,
    Query(query): Query<BikeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.gateway.backend().fetch_data(BIKES_ENDPOINT).await?;
    let Some(records) = data.as_array() else {
        warn!("Bike list is not an array");
        return Err(ApiError::BadGateway("Invalid backend response".into()));
    };

    let page = parse_positive(query.page.as_deref(), 1);
    let today = Local::now().date_naive();
    Ok(Json(bike_page(records, &query.filter(), page, today)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActivityQuery {
    page: Option<String>,
    limit: Option<String>,
    filter: Option<String>,
}

impl ActivityQuery {
    fn endpoint(&self) -> String {
        let page = parse_positive(self.page.as_deref(), 1);
        let limit = parse_positive(self.limit.as_deref(), DEFAULT_ACTIVITY_LIMIT);
        let filter = self
            .filter
            .as_deref()
            .map(DateRangeFilter::parse)
            .unwrap_or_default();

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("filter", filter.as_str())
            .finish();
        format!("{}?{}", ACTIVITY_ENDPOINT, query)
    }
}

async fn activity(
    State(state): State<AppState>,
    SignedIn { store, .. }: SignedIn,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut body = state.gateway.get(&*store, &query.endpoint()).await?;
    annotate_activities(&mut body);
    Ok(Json(body))
}

async fn brands(_signed_in: SignedIn) -> impl IntoResponse {
    Json(BRANDS)
}

/// Record ids are plain tokens; slashes, dots and query characters are refused.
fn record_id(id: &str) -> Result<&str, ApiError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ApiError::bad_request("Invalid user id"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct UserListResponse {
    users: Vec<Value>,
}

async fn users(
    State(state): State<AppState>,
    SignedIn { store, .. }: SignedIn,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.gateway.get(&*store, USERS_ENDPOINT).await?;
    let users = search_users(records(&body), query.q.as_deref().unwrap_or_default());
    Ok(Json(UserListResponse { users }))
}

async fn create_user(
    State(state): State<AppState>,
    SignedIn { store, .. }: SignedIn,
    Json(values): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .gateway
        .post_json(&*store, USERS_ENDPOINT, values)
        .await?;
    info!("User created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_user(
    State(state): State<AppState>,
    SignedIn { store, .. }: SignedIn,
    Path(id): Path<String>,
    Json(values): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let id = record_id(&id)?;
    let updated = state
        .gateway
        .patch_json(&*store, USERS_ENDPOINT, id, values)
        .await?;
    info!(user_id = %id, "User updated");
    Ok(Json(updated))
}

async fn delete_user(
    State(state): State<AppState>,
    SignedIn { store, .. }: SignedIn,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = record_id(&id)?;
    let deleted = state
        .gateway
        .delete_by_id(&*store, USERS_ENDPOINT, id)
        .await?;
    info!(user_id = %id, "User deleted");
    Ok(Json(deleted))
}

async fn user_stats(
    State(state): State<AppState>,
    _signed_in: SignedIn,
    Path(id): Path<String>,
) -> Result<Json<UserStatistics>, ApiError> {
    let id = record_id(&id)?;
    let backend = state.gateway.backend();

    let activity = backend
        .fetch_data(&format!("{}/{}", ACTIVITY_ENDPOINT, id))
        .await?;
    let user = backend
        .fetch_data(&format!("{}/{}", USERS_ENDPOINT, id))
        .await?;

    let mut stats = user_statistics(records(&activity), Utc::now().date_naive());
    stats.account_created = user
        .get("createdAt")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(Json(stats))
}
