//! User list search and per-user activity statistics.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;

/// Activity `action` counted as a sign-in.
const SIGN_IN_ACTION: &str = "Sign In";

/// Records of a list response: a bare array or an object wrapping it in `data`.
pub fn records(body: &Value) -> &[Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    }
}

fn text_contains(user: &Value, field: &str, needle: &str) -> bool {
    user.get(field)
        .and_then(Value::as_str)
        .is_some_and(|v| v.to_lowercase().contains(needle))
}

/// Users whose name or email contains `query`, ignoring case. A blank query
/// keeps every user.
pub fn search_users(users: &[Value], query: &str) -> Vec<Value> {
    let query = query.trim().to_lowercase();
    users
        .iter()
        .filter(|user| {
            query.is_empty()
                || text_contains(user, "name", &query)
                || text_contains(user, "email", &query)
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub total_sign_ins: usize,
    pub actions_today: usize,
    /// Latest activity timestamp, as the backend wrote it
    pub last_active: Option<String>,
    pub account_created: Option<String>,
}

fn created_at(entry: &Value) -> Option<&str> {
    entry.get("createdAt").and_then(Value::as_str)
}

/// Summarize a user's activity. `today` is the UTC date; an entry counts
/// for today when its `createdAt` starts with that date.
pub fn user_statistics(activity: &[Value], today: NaiveDate) -> UserStatistics {
    let today = today.format("%Y-%m-%d").to_string();

    let total_sign_ins = activity
        .iter()
        .filter(|e| e.get("action").and_then(Value::as_str) == Some(SIGN_IN_ACTION))
        .count();

    let actions_today = activity
        .iter()
        .filter_map(created_at)
        .filter(|at| at.starts_with(&today))
        .count();

    let last_active = activity
        .iter()
        .filter_map(created_at)
        .filter_map(|at| DateTime::parse_from_rfc3339(at).ok().map(|parsed| (parsed, at)))
        .max_by_key(|(parsed, _)| *parsed)
        .map(|(_, at)| at.to_string());

    UserStatistics {
        total_sign_ins,
        actions_today,
        last_active,
        account_created: None,
    }
}
