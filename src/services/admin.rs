use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::error::{Error, Result};
use crate::http::{ApiRequest, Transport};
use crate::models::{Car, ModerationStatus, User, UserFlag};
use crate::normalize::{normalize_cars, normalize_users};
use crate::resolve::resolve_first;
use crate::store::{keys, LocalStore};

use super::now_millis;

/// Moderation actions. Approve/reject and user deletion are
/// backend-authoritative and fail when no endpoint answers; flag and block
/// fall back to advisory client-local lists that are not guaranteed
/// consistent with any other session.
pub struct AdminService {
    transport: Arc<dyn Transport>,
    store: Arc<LocalStore>,
}

impl AdminService {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<LocalStore>) -> Self {
        Self { transport, store }
    }

    /// Listings awaiting moderation
    pub async fn get_pending_cars(&self) -> Vec<Car> {
        let candidates = [
            ApiRequest::get("/admin/cars/pending"),
            ApiRequest::get("/api/admin.php?action=pending"),
            ApiRequest::get("/api/router.php?route=admin&action=pending"),
        ];
        if let Some(cars) = resolve_first(self.transport.as_ref(), &candidates, normalize_cars).await
        {
            return cars;
        }

        self.store
            .stored_cars(now_millis())
            .into_iter()
            .filter(|car| car.status == ModerationStatus::Pending)
            .collect()
    }

    /// PENDING -> APPROVED
    pub async fn approve_car(&self, id: i64) -> Result<()> {
        let candidates = [
            ApiRequest::post(format!("/admin/cars/{id}/approve"), json!({})),
            ApiRequest::put("/api/admin.php".to_string(), json!({"action": "approve", "id": id})),
        ];
        resolve_first(self.transport.as_ref(), &candidates, |_| Some(()))
            .await
            .ok_or(Error::Unavailable("approve listing"))
    }

    /// PENDING -> REJECTED. Terminal: the listing leaves the pending set.
    pub async fn reject_car(&self, id: i64) -> Result<()> {
        let candidates = [
            ApiRequest::post(format!("/admin/cars/{id}/reject"), json!({})),
            ApiRequest::put("/api/admin.php".to_string(), json!({"action": "reject", "id": id})),
        ];
        resolve_first(self.transport.as_ref(), &candidates, |_| Some(()))
            .await
            .ok_or(Error::Unavailable("reject listing"))
    }

    /// All accounts, with locally recorded flags and blocks overlaid so the
    /// panel reflects advisory actions taken while the backend was down
    pub async fn get_all_users(&self) -> Vec<User> {
        let candidates = [
            ApiRequest::get("/admin/users"),
            ApiRequest::get("/api/admin.php?action=users"),
            ApiRequest::get("/api/router.php?route=admin&action=users"),
        ];
        let mut users = resolve_first(self.transport.as_ref(), &candidates, normalize_users)
            .await
            .unwrap_or_else(|| {
                warn!("No user listing endpoint reachable");
                Vec::new()
            });

        let blocked = self.blocked_users();
        let flags = self.local_flags();
        for user in &mut users {
            if blocked.contains(&user.id) {
                user.blocked = true;
            }
            if let Some(flag) = flags.iter().find(|f| f.id == user.id) {
                user.flagged = true;
                if user.flag_reason.is_none() {
                    user.flag_reason = flag.reason.clone();
                }
            }
        }
        users
    }

    /// Backend-authoritative; never faked locally
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let candidates = [
            ApiRequest::delete(format!("/admin/users/{id}")),
            ApiRequest::delete(format!("/api/admin.php?action=deleteUser&id={id}")),
        ];
        resolve_first(self.transport.as_ref(), &candidates, |_| Some(()))
            .await
            .ok_or(Error::Unavailable("delete user"))
    }

    pub async fn block_user(&self, id: i64) {
        let candidates = [
            ApiRequest::post(format!("/admin/users/{id}/block"), json!({})),
            ApiRequest::post(format!("/api/admin.php?action=block&id={id}"), json!({})),
        ];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_none() {
            warn!("Block endpoint unavailable, recording block locally for user {}", id);
            let mut blocked = self.blocked_users();
            if !blocked.contains(&id) {
                blocked.push(id);
                self.store.set(keys::BLOCKED_USERS, &blocked);
            }
        }
    }

    pub async fn unblock_user(&self, id: i64) {
        let candidates = [
            ApiRequest::post(format!("/admin/users/{id}/unblock"), json!({})),
            ApiRequest::post(format!("/api/admin.php?action=unblock&id={id}"), json!({})),
        ];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_none() {
            let blocked: Vec<i64> =
                self.blocked_users().into_iter().filter(|b| *b != id).collect();
            self.store.set(keys::BLOCKED_USERS, &blocked);
        }
    }

    /// Flag a seller. At most one flag per user id: flagging again replaces
    /// the reason and timestamp.
    pub async fn flag_user(&self, id: i64, reason: Option<String>) {
        let candidates = [
            ApiRequest::post(format!("/admin/users/{id}/flag"), json!({"reason": reason})),
            ApiRequest::post(
                format!("/api/admin.php?action=flag&id={id}"),
                json!({"reason": reason}),
            ),
        ];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_none() {
            warn!("Flag endpoint unavailable, recording flag locally for user {}", id);
            let mut flags = self.local_flags();
            let flag = UserFlag { id, reason, at: now_millis() };
            match flags.iter_mut().find(|f| f.id == id) {
                Some(existing) => *existing = flag,
                None => flags.push(flag),
            }
            self.store.set(keys::FLAGGED_USERS, &flags);
        }
    }

    pub async fn unflag_user(&self, id: i64) {
        let candidates = [
            ApiRequest::post(format!("/admin/users/{id}/unflag"), json!({})),
            ApiRequest::post(format!("/api/admin.php?action=unflag&id={id}"), json!({})),
        ];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_none() {
            let flags: Vec<UserFlag> =
                self.local_flags().into_iter().filter(|f| f.id != id).collect();
            self.store.set(keys::FLAGGED_USERS, &flags);
        }
    }

    /// Advisory local flag record for a user, if any
    pub fn get_flag_for_user(&self, id: i64) -> Option<UserFlag> {
        self.local_flags().into_iter().find(|f| f.id == id)
    }

    pub fn blocked_users(&self) -> Vec<i64> {
        self.store.get(keys::BLOCKED_USERS).unwrap_or_default()
    }

    fn local_flags(&self) -> Vec<UserFlag> {
        self.store.get(keys::FLAGGED_USERS).unwrap_or_default()
    }
}
