//! User activity log helpers.

use serde::Serialize;
use serde_json::Value;

/// Coarse category of an audit-trail action, used for grouping and icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Signin,
    Signout,
    Update,
    Create,
    Delete,
    System,
    Other,
}

impl ActionKind {
    /// First matching rule wins.
    pub fn classify(action: &str) -> Self {
        let action = action.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| action.contains(w));

        if has(&["signin", "login"]) {
            ActionKind::Signin
        } else if has(&["logout", "signout"]) {
            ActionKind::Signout
        } else if has(&["update", "edit"]) {
            ActionKind::Update
        } else if has(&["create", "add"]) {
            ActionKind::Create
        } else if has(&["delete", "remove"]) {
            ActionKind::Delete
        } else if has(&["system", "config"]) {
            ActionKind::System
        } else {
            ActionKind::Other
        }
    }
}

fn annotate_entry(entry: &mut Value) {
    let Some(obj) = entry.as_object_mut() else {
        return;
    };
    let kind = ActionKind::classify(obj.get("action").and_then(Value::as_str).unwrap_or(""));
    if let Ok(kind) = serde_json::to_value(kind) {
        obj.insert("kind".to_string(), kind);
    }
}

/// Add a `kind` field to every entry. Accepts a bare array or an object whose
/// `data` field is the array.
pub fn annotate_activities(body: &mut Value) {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(obj) => match obj.get_mut("data") {
            Some(Value::Array(entries)) => entries,
            _ => return,
        },
        _ => return,
    };
    entries.iter_mut().for_each(annotate_entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        assert_eq!(ActionKind::classify("User Login"), ActionKind::Signin);
        assert_eq!(ActionKind::classify("signout"), ActionKind::Signout);
        assert_eq!(ActionKind::classify("Edit bike"), ActionKind::Update);
        assert_eq!(ActionKind::classify("ADD_USER"), ActionKind::Create);
        assert_eq!(ActionKind::classify("remove message"), ActionKind::Delete);
        assert_eq!(ActionKind::classify("config change"), ActionKind::System);
        assert_eq!(ActionKind::classify("viewed page"), ActionKind::Other);
    }

    #[test]
    fn test_classify_priority() {
        // "login" is checked before "add"
        assert_eq!(ActionKind::classify("login from address"), ActionKind::Signin);
    }

    #[test]
    fn test_annotate_array_and_wrapped() {
        let mut bare = json!([{"action": "create bike"}, {"action": "logout"}, "junk"]);
        annotate_activities(&mut bare);
        assert_eq!(bare[0]["kind"], "create");
        assert_eq!(bare[1]["kind"], "signout");
        assert_eq!(bare[2], "junk");

        let mut wrapped = json!({"data": [{"action": "delete user"}], "total": 1});
        annotate_activities(&mut wrapped);
        assert_eq!(wrapped["data"][0]["kind"], "delete");
    }
}
