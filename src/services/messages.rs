use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::http::{ApiRequest, Transport};
use crate::models::{Message, SendMessageData};
use crate::normalize::{normalize_message, normalize_messages};
use crate::resolve::resolve_first;
use crate::store::{keys, LocalStore};

use super::now_millis;

/// Messaging between buyers and sellers. The backend is used when reachable;
/// otherwise messages live in the local demo store. Deletion is client-local
/// by design (no backend endpoint exists for it) and is best-effort only.
pub struct MessageService {
    transport: Arc<dyn Transport>,
    store: Arc<LocalStore>,
}

impl MessageService {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<LocalStore>) -> Self {
        Self { transport, store }
    }

    pub async fn send_message(&self, from_user_id: i64, data: SendMessageData) -> Message {
        let body = json!({
            "toUserId": data.to_user_id,
            "carId": data.car_id,
            "subject": data.subject,
            "content": data.content,
        });
        let candidates = [
            ApiRequest::post("/api/messages", body.clone()),
            ApiRequest::post("/api/messages.php?action=send", body.clone()),
            ApiRequest::post("/api/router.php?route=messages&action=send", body),
        ];
        let parse = |raw: &Value| {
            let msg = normalize_message(raw);
            (!msg.id.is_empty()).then_some(msg)
        };
        if let Some(message) = resolve_first(self.transport.as_ref(), &candidates, parse).await {
            return message;
        }

        warn!("No messaging endpoint reachable, storing message locally");
        let mut messages = self.local_messages();
        let mut now = now_millis();
        // Two sends inside the same millisecond must not share an id
        while messages.iter().any(|m| m.id == now.to_string()) {
            now += 1;
        }
        let message = Message {
            id: now.to_string(),
            from_user_id,
            to_user_id: data.to_user_id,
            from_user_name: None,
            to_user_name: None,
            car_id: data.car_id,
            subject: data.subject,
            content: data.content,
            timestamp: now,
            read: false,
        };
        messages.push(message.clone());
        self.store.set(keys::MESSAGES, &messages);
        message
    }

    /// Full inbox view: backend when reachable, local store otherwise
    pub async fn get_messages(&self) -> Vec<Message> {
        let candidates = [
            ApiRequest::get("/api/messages/inbox"),
            ApiRequest::get("/api/messages.php?action=inbox"),
            ApiRequest::get("/api/router.php?route=messages&action=inbox"),
        ];
        if let Some(messages) =
            resolve_first(self.transport.as_ref(), &candidates, normalize_messages).await
        {
            return messages;
        }
        self.local_messages()
    }

    /// Messages received by a user, newest first
    pub async fn get_received_messages(&self, user_id: i64) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .get_messages()
            .await
            .into_iter()
            .filter(|msg| msg.to_user_id == user_id)
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages
    }

    /// Messages sent by a user, newest first
    pub async fn get_sent_messages(&self, user_id: i64) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .get_messages()
            .await
            .into_iter()
            .filter(|msg| msg.from_user_id == user_id)
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages
    }

    /// Conversation about one listing, oldest first
    pub async fn get_thread(&self, car_id: &str) -> Vec<Message> {
        let candidates = [
            ApiRequest::get(format!("/api/messages/thread/{car_id}")),
            ApiRequest::get(format!("/api/messages.php?action=thread&car_id={car_id}")),
        ];
        if let Some(messages) =
            resolve_first(self.transport.as_ref(), &candidates, normalize_messages).await
        {
            return messages;
        }

        let mut messages: Vec<Message> = self
            .local_messages()
            .into_iter()
            .filter(|msg| msg.car_id == car_id)
            .collect();
        messages.sort_by_key(|msg| msg.timestamp);
        messages
    }

    pub async fn get_message_by_id(&self, id: &str) -> Option<Message> {
        self.get_messages().await.into_iter().find(|msg| msg.id == id)
    }

    /// Mark a message read. The read flag only ever goes false to true. The
    /// backend read-receipt is best-effort; the local store is always
    /// updated so the state survives a failed call.
    pub async fn mark_as_read(&self, id: &str) {
        let candidates = [
            ApiRequest::post(format!("/api/messages/{id}/read"), json!({})),
            ApiRequest::post(format!("/api/messages.php?action=read&id={id}"), json!({})),
        ];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_none() {
            debug!("Read receipt for message {} not delivered, keeping local state", id);
        }

        let mut messages = self.local_messages();
        let mut changed = false;
        for msg in &mut messages {
            if msg.id == id && !msg.read {
                msg.read = true;
                changed = true;
            }
        }
        if changed {
            self.store.set(keys::MESSAGES, &messages);
        }
    }

    /// Remove a message from the local view. Client-local only; other
    /// sessions are not guaranteed to agree.
    pub fn delete_message(&self, id: &str) {
        let messages: Vec<Message> = self
            .local_messages()
            .into_iter()
            .filter(|msg| msg.id != id)
            .collect();
        self.store.set(keys::MESSAGES, &messages);
    }

    fn local_messages(&self) -> Vec<Message> {
        self.store.get(keys::MESSAGES).unwrap_or_default()
    }
}
