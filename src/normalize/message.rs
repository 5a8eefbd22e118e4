use serde_json::Value;

use crate::models::Message;

use super::{
    bool_field, coerce_string, i64_field, opt_str_field, pick, str_field, unwrap_collection,
    unwrap_entity,
};

/// Normalize one message payload. Ids are coerced to strings (backends emit
/// both), timestamps are epoch millis.
pub fn normalize_message(raw: &Value) -> Message {
    let raw = unwrap_entity(raw, &["data", "message"]);

    Message {
        id: pick(raw, &["id", "messageId", "message_id"])
            .and_then(coerce_string)
            .unwrap_or_default(),
        from_user_id: i64_field(raw, &["fromUserId", "from_user_id", "from"], 0),
        to_user_id: i64_field(raw, &["toUserId", "to_user_id", "to"], 0),
        from_user_name: opt_str_field(raw, &["fromUserName", "from_user_name", "fromName"]),
        to_user_name: opt_str_field(raw, &["toUserName", "to_user_name", "toName"]),
        car_id: pick(raw, &["carId", "car_id"])
            .and_then(coerce_string)
            .unwrap_or_default(),
        subject: str_field(raw, &["subject"], ""),
        content: str_field(raw, &["content", "body", "message"], ""),
        timestamp: i64_field(raw, &["timestamp", "sentAt", "sent_at"], 0),
        read: bool_field(raw, &["read", "is_read", "isRead"], false),
    }
}

pub fn normalize_messages(raw: &Value) -> Option<Vec<Message>> {
    Some(unwrap_collection(raw)?.iter().map(normalize_message).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_coerce_to_strings() {
        let msg = normalize_message(&json!({"id": 42, "car_id": 7}));
        assert_eq!(msg.id, "42");
        assert_eq!(msg.car_id, "7");
    }

    #[test]
    fn snake_case_aliases_and_numeric_read_flag() {
        let msg = normalize_message(&json!({
            "id": "m1",
            "from_user_id": 3,
            "to_user_id": 4,
            "subject": "Consulta",
            "body": "¿Sigue disponible?",
            "timestamp": 1700000000000i64,
            "is_read": 1
        }));
        assert_eq!(msg.from_user_id, 3);
        assert_eq!(msg.to_user_id, 4);
        assert_eq!(msg.content, "¿Sigue disponible?");
        assert!(msg.read);
    }

    #[test]
    fn inbox_wrapper_unwraps() {
        let raw = json!({"inbox": [{"id": "a"}, {"id": "b"}]});
        assert_eq!(normalize_messages(&raw).unwrap().len(), 2);
    }

    #[test]
    fn normalizing_a_canonical_message_is_idempotent() {
        let first = normalize_message(&json!({
            "id": "9",
            "fromUserId": 1,
            "toUserId": 2,
            "carId": "5",
            "subject": "Oferta",
            "content": "Le ofrezco 800000",
            "timestamp": 1700000000000i64,
            "read": false
        }));
        let second = normalize_message(&serde_json::to_value(&first).unwrap());
        assert_eq!(first, second);
    }
}
