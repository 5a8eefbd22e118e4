use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http::{ApiRequest, Transport};
use crate::models::{Session, UpdateProfileData};
use crate::normalize::normalize_session;
use crate::resolve::resolve_first;
use crate::store::{keys, LocalStore};
use crate::validate;

/// Login, registration and the persisted session. The session record is the
/// source of the bearer token the transport attaches to every request.
pub struct AuthService {
    transport: Arc<dyn Transport>,
    store: Arc<LocalStore>,
}

impl AuthService {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<LocalStore>) -> Self {
        Self { transport, store }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        validate::validate_email(email)?;
        validate::validate_password(password)?;

        let body = json!({"email": email, "password": password});
        let candidates = [
            ApiRequest::post("/api/auth/login", body),
            ApiRequest::post(
                "/api/auth.php",
                json!({"action": "login", "email": email, "password": password}),
            ),
        ];
        let session = resolve_first(self.transport.as_ref(), &candidates, normalize_session)
            .await
            .ok_or(Error::Unavailable("login"))?;

        info!("Logged in as {} ({:?})", session.username, session.role);
        self.store.set(keys::SESSION, &session);
        Ok(session)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        validate::validate_username(username)?;
        validate::validate_email(email)?;
        validate::validate_password(password)?;

        let body = json!({"username": username, "email": email, "password": password});
        let candidates = [
            ApiRequest::post("/api/auth/register", body),
            ApiRequest::post(
                "/api/auth.php",
                json!({"action": "register", "username": username, "email": email, "password": password}),
            ),
        ];
        let session = resolve_first(self.transport.as_ref(), &candidates, normalize_session)
            .await
            .ok_or(Error::Unavailable("register"))?;

        self.store.set(keys::SESSION, &session);
        Ok(session)
    }

    /// Refresh the persisted session from the backend; falls back to the
    /// stored record when unreachable. The token from the original login is
    /// kept when the refresh response does not carry one.
    pub async fn me(&self) -> Option<Session> {
        let stored = self.current_session();
        let candidates = [ApiRequest::get("/api/auth/me")];
        match resolve_first(self.transport.as_ref(), &candidates, normalize_session).await {
            Some(mut fresh) => {
                if fresh.token.is_none() {
                    fresh.token = stored.and_then(|s| s.token);
                }
                self.store.set(keys::SESSION, &fresh);
                Some(fresh)
            }
            None => stored,
        }
    }

    pub async fn update_profile(&self, user_id: i64, data: UpdateProfileData) -> Result<Session> {
        if let Some(username) = &data.username {
            validate::validate_username(username)?;
        }
        if let Some(email) = &data.email {
            validate::validate_email(email)?;
        }

        let body = json!({"username": data.username, "email": data.email});
        let candidates = [
            ApiRequest::put(format!("/api/users/{user_id}"), body.clone()),
            ApiRequest::put(format!("/api/auth.php?action=update&id={user_id}"), body),
        ];
        let mut updated = resolve_first(self.transport.as_ref(), &candidates, normalize_session)
            .await
            .ok_or(Error::Unavailable("update profile"))?;

        if let Some(current) = self.current_session() {
            if current.id == updated.id {
                if updated.token.is_none() {
                    updated.token = current.token;
                }
                self.store.set(keys::SESSION, &updated);
            }
        }
        Ok(updated)
    }

    /// Best-effort backend call; the local session is destroyed regardless
    pub async fn logout(&self) {
        let candidates = [ApiRequest::post("/api/auth/logout", json!({}))];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_none() {
            debug!("Logout endpoint unreachable, clearing local session anyway");
        }
        self.store.remove(keys::SESSION);
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.get(keys::SESSION)
    }
}
