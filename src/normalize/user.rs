use serde_json::Value;

use crate::http::bearer_token;
use crate::models::{Role, Session, User};

use super::{bool_field, i64_field, opt_str_field, str_field, unwrap_collection, unwrap_entity};

fn role_field(raw: &Value) -> Role {
    match str_field(raw, &["role"], "user").to_ascii_lowercase().as_str() {
        "admin" => Role::Admin,
        _ => Role::User,
    }
}

fn display_name(raw: &Value) -> String {
    if let Some(name) = opt_str_field(raw, &["username", "nombre", "name", "userName"]) {
        return name;
    }
    raw.get("user")
        .and_then(|user| opt_str_field(user, &["username", "nombre", "name"]))
        .unwrap_or_default()
}

/// Normalize an administered account record
pub fn normalize_user(raw: &Value) -> User {
    User {
        id: i64_field(raw, &["id", "user_id", "userId"], 0),
        username: display_name(raw),
        email: str_field(raw, &["email"], ""),
        role: role_field(raw),
        created_at: opt_str_field(raw, &["created_at", "createdAt"]),
        blocked: bool_field(raw, &["blocked"], false),
        flagged: bool_field(raw, &["flagged"], false),
        flag_reason: opt_str_field(raw, &["flag_reason", "flagReason"]),
    }
}

pub fn normalize_users(raw: &Value) -> Option<Vec<User>> {
    Some(unwrap_collection(raw)?.iter().map(normalize_user).collect())
}

/// Interpret a login/register/me response. The user record may sit at the
/// top level or under an envelope key; the token may live beside either.
/// `None` when no user id is recognizable.
pub fn normalize_session(raw: &Value) -> Option<Session> {
    let user = unwrap_entity(raw, &["user", "data"]);
    let id = i64_field(user, &["id", "user_id", "userId"], 0);
    if id == 0 {
        return None;
    }

    Some(Session {
        id,
        username: display_name(user),
        email: str_field(user, &["email"], ""),
        role: role_field(user),
        token: bearer_token(raw).or_else(|| bearer_token(user)),
    })
}
