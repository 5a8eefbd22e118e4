use serde_json::Value;

use crate::models::{Car, ModerationStatus};

use super::{
    bool_field, coerce_i64, i64_field, normalize_images, opt_str_field, pick, str_field,
    string_list, unwrap_collection, unwrap_entity, PLACEHOLDER_IMAGE,
};

/// Normalize one listing payload into a canonical [`Car`].
///
/// Vehicle attributes may live at the top level or inside a `technical`
/// field, which itself may arrive as an object or as a JSON-encoded string
/// (malformed JSON reads as empty).
pub fn normalize_car(raw: &Value) -> Car {
    let raw = unwrap_entity(raw, &["data", "car"]);
    let technical = technical_object(raw);

    let images = {
        let mut urls = pick(raw, &["images", "image"])
            .map(normalize_images)
            .unwrap_or_default();
        if urls.is_empty() {
            urls.push(PLACEHOLDER_IMAGE.to_string());
        }
        urls
    };

    Car {
        id: i64_field(raw, &["id", "carId", "car_id"], 0),
        title: str_field(raw, &["title"], ""),
        description: str_field(raw, &["description"], ""),
        price: i64_field(raw, &["price"], 0),
        location: str_field(raw, &["location"], ""),
        images,
        user_id: i64_field(raw, &["userId", "user_id", "ownerId", "owner_id"], 0),
        user_name: owner_name(raw),
        user_email: str_field(raw, &["userEmail", "user_email", "email"], ""),
        status: moderation_status(raw),
        created_at: str_field(raw, &["createdAt", "created_at"], ""),
        created_at_timestamp: pick(raw, &["createdAtTimestamp", "created_at_timestamp"])
            .and_then(|v| coerce_i64(v)),
        brand: vehicle_field(raw, &technical, &["brand", "make"]),
        model: vehicle_field(raw, &technical, &["model"]),
        year: vehicle_i64(raw, &technical, &["year"], 0) as i32,
        mileage: vehicle_i64(raw, &technical, &["mileage", "km"], 0),
        fuel_type: vehicle_field(raw, &technical, &["fuelType", "fuel_type", "fuel"]),
        transmission: vehicle_field(raw, &technical, &["transmission"]),
        engine: vehicle_field(raw, &technical, &["engine"]),
        color: vehicle_field(raw, &technical, &["color"]),
        doors: vehicle_i64(raw, &technical, &["doors"], 0),
        body_type: vehicle_field(raw, &technical, &["bodyType", "body_type"]),
        features: string_list(raw, &["features"]),
        issues: string_list(raw, &["issues"]),
        payment_methods: string_list(raw, &["paymentMethods", "payment_methods"]),
        warranty: bool_field(raw, &["warranty"], false),
        warranty_details: opt_str_field(raw, &["warrantyDetails", "warranty_details"]),
    }
}

/// Normalize a listing collection. `None` means the payload is not
/// array-like under any known wrapper key, so the resolver moves on.
pub fn normalize_cars(raw: &Value) -> Option<Vec<Car>> {
    Some(unwrap_collection(raw)?.iter().map(normalize_car).collect())
}

fn technical_object(raw: &Value) -> Value {
    match raw.get("technical") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(Value::String(s)) => {
            serde_json::from_str::<Value>(s)
                .ok()
                .filter(Value::is_object)
                .unwrap_or_else(|| Value::Object(Default::default()))
        }
        _ => Value::Object(Default::default()),
    }
}

fn vehicle_field(raw: &Value, technical: &Value, aliases: &[&str]) -> String {
    opt_str_field(raw, aliases)
        .or_else(|| opt_str_field(technical, aliases))
        .unwrap_or_default()
}

fn vehicle_i64(raw: &Value, technical: &Value, aliases: &[&str], default: i64) -> i64 {
    pick(raw, aliases)
        .or_else(|| pick(technical, aliases))
        .and_then(|v| coerce_i64(v))
        .unwrap_or(default)
}

fn owner_name(raw: &Value) -> String {
    if let Some(name) = opt_str_field(raw, &["userName", "username", "nombre", "name"]) {
        return name;
    }
    raw.get("user")
        .and_then(|user| opt_str_field(user, &["username", "nombre", "name"]))
        .unwrap_or_default()
}

/// Status string when present, otherwise the historical `approved` boolean
/// (also accepted as `1`/`0`).
fn moderation_status(raw: &Value) -> ModerationStatus {
    if let Some(status) = opt_str_field(raw, &["status"]) {
        match status.to_ascii_lowercase().as_str() {
            "approved" => return ModerationStatus::Approved,
            "rejected" => return ModerationStatus::Rejected,
            "pending" => return ModerationStatus::Pending,
            _ => {}
        }
    }
    if bool_field(raw, &["approved"], false) {
        ModerationStatus::Approved
    } else {
        ModerationStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_optional_lists_become_empty() {
        let car = normalize_car(&json!({"id": 1, "title": "Bare"}));
        assert!(car.features.is_empty());
        assert!(car.issues.is_empty());
        assert!(car.payment_methods.is_empty());
        assert_eq!(car.images, vec![PLACEHOLDER_IMAGE]);
    }

    #[test]
    fn no_placeholder_when_a_url_exists() {
        let car = normalize_car(&json!({"id": 1, "images": ["/real.jpg"]}));
        assert_eq!(car.images, vec!["/real.jpg"]);
        let car = normalize_car(&json!({"id": 1, "image": "/single.jpg"}));
        assert_eq!(car.images, vec!["/single.jpg"]);
    }

    #[test]
    fn media_object_images_flatten_to_urls() {
        let car = normalize_car(&json!({
            "id": 1,
            "images": [{"url": "/a.jpg"}, {"filename": "/b.jpg"}]
        }));
        assert_eq!(car.images, vec!["/a.jpg", "/b.jpg"]);
    }

    #[test]
    fn field_aliases_map_to_canonical_names() {
        let car = normalize_car(&json!({
            "car_id": 7,
            "make": "Ford",
            "user_id": 3,
            "nombre": "María",
            "payment_methods": ["Efectivo"],
            "created_at": "2025-01-10T14:30:00Z"
        }));
        assert_eq!(car.id, 7);
        assert_eq!(car.brand, "Ford");
        assert_eq!(car.user_id, 3);
        assert_eq!(car.user_name, "María");
        assert_eq!(car.payment_methods, vec!["Efectivo"]);
        assert_eq!(car.created_at, "2025-01-10T14:30:00Z");
    }

    #[test]
    fn nested_owner_object_supplies_the_name() {
        let car = normalize_car(&json!({"id": 1, "user": {"username": "carlos"}}));
        assert_eq!(car.user_name, "carlos");
    }

    #[test]
    fn technical_accepts_object_string_and_garbage() {
        let car = normalize_car(&json!({"id": 1, "technical": {"engine": "1.8L", "doors": 4}}));
        assert_eq!(car.engine, "1.8L");
        assert_eq!(car.doors, 4);

        let car = normalize_car(&json!({"id": 1, "technical": "{\"engine\":\"2.0L\"}"}));
        assert_eq!(car.engine, "2.0L");

        let car = normalize_car(&json!({"id": 1, "technical": "{broken"}));
        assert_eq!(car.engine, "");
    }

    #[test]
    fn approved_flag_accepts_numeric_and_boolean_forms() {
        assert!(normalize_car(&json!({"id": 1, "approved": 1})).is_approved());
        assert!(normalize_car(&json!({"id": 1, "approved": true})).is_approved());
        assert!(!normalize_car(&json!({"id": 1, "approved": 0})).is_approved());
        assert_eq!(
            normalize_car(&json!({"id": 1, "status": "rejected"})).status,
            ModerationStatus::Rejected
        );
    }

    #[test]
    fn normalizing_a_canonical_listing_is_idempotent() {
        let first = normalize_car(&json!({
            "id": 42,
            "title": "Toyota Corolla 2020",
            "description": "Excelente estado",
            "price": 850000,
            "location": "Salta",
            "images": ["/images/cars/corolla.jpg"],
            "userId": 1,
            "userName": "Carlos",
            "userEmail": "carlos@example.com",
            "approved": 1,
            "createdAt": "2025-01-15T10:00:00Z",
            "brand": "Toyota",
            "model": "Corolla",
            "year": 2020,
            "mileage": 45000,
            "fuelType": "nafta",
            "transmission": "automatico",
            "engine": "1.8L",
            "color": "Blanco",
            "doors": 4,
            "bodyType": "Sedán",
            "features": ["ABS"],
            "paymentMethods": ["Efectivo"],
            "warranty": true,
            "warrantyDetails": "Hasta 2027"
        }));

        let second = normalize_car(&serde_json::to_value(&first).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn wrapped_collections_normalize() {
        let raw = json!({"cars": [{"id": 1}, {"id": 2}]});
        let cars = normalize_cars(&raw).unwrap();
        assert_eq!(cars.len(), 2);
        assert!(normalize_cars(&json!({"oops": 1})).is_none());
    }
}
