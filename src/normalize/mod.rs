//! Entity normalizers: accept whatever shape the backend returned and
//! produce fully-populated canonical records with defaulted fields. Nothing
//! in this module fails; unusable input degrades to defaults.

pub mod car;
pub mod message;
pub mod review;
pub mod user;

pub use car::{normalize_car, normalize_cars};
pub use message::{normalize_message, normalize_messages};
pub use review::{normalize_review, normalize_reviews_response, normalize_summary};
pub use user::{normalize_session, normalize_user, normalize_users};

use serde_json::Value;

/// Substituted as the cover image when a listing has no usable image URL
pub const PLACEHOLDER_IMAGE: &str = "/images/cars/default-car.svg";

/// Wrapper keys under which different backend versions nest their arrays
pub const WRAPPER_KEYS: &[&str] = &[
    "data", "cars", "items", "results", "payload", "pending", "messages", "users", "inbox",
];

/// Accept a bare array, or an object where any well-known wrapper key holds
/// an array. Anything else is uninterpretable.
pub fn unwrap_collection(raw: &Value) -> Option<Vec<Value>> {
    if let Some(arr) = raw.as_array() {
        return Some(arr.clone());
    }
    let obj = raw.as_object()?;
    for key in WRAPPER_KEYS {
        if let Some(arr) = obj.get(*key).and_then(Value::as_array) {
            return Some(arr.clone());
        }
    }
    None
}

/// Single-entity analog of [`unwrap_collection`]: some backend versions wrap
/// one record under an envelope key. Callers pass the keys plausible for
/// their entity so a nested association (e.g. a listing's `user`) is not
/// mistaken for an envelope.
pub fn unwrap_entity<'a>(raw: &'a Value, keys: &[&str]) -> &'a Value {
    for key in keys {
        if let Some(inner) = raw.get(*key) {
            if inner.is_object() {
                return inner;
            }
        }
    }
    raw
}

/// First non-null value among several historical field names
pub fn pick<'a>(raw: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    for key in aliases {
        match raw.get(*key) {
            Some(Value::Null) | None => continue,
            Some(v) => return Some(v),
        }
    }
    None
}

pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Booleans arrive as `true`, `1`, `"1"` or `"true"` depending on the
/// backend version
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_i64().unwrap_or(0) != 0 || n.as_f64().unwrap_or(0.0) != 0.0),
        Value::String(s) => match s.trim() {
            "1" | "true" | "TRUE" | "True" => Some(true),
            "0" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn str_field(raw: &Value, aliases: &[&str], default: &str) -> String {
    pick(raw, aliases)
        .and_then(coerce_string)
        .unwrap_or_else(|| default.to_string())
}

pub fn opt_str_field(raw: &Value, aliases: &[&str]) -> Option<String> {
    pick(raw, aliases).and_then(coerce_string).filter(|s| !s.is_empty())
}

pub fn i64_field(raw: &Value, aliases: &[&str], default: i64) -> i64 {
    pick(raw, aliases).and_then(|v| coerce_i64(v)).unwrap_or(default)
}

pub fn bool_field(raw: &Value, aliases: &[&str], default: bool) -> bool {
    pick(raw, aliases).and_then(|v| coerce_bool(v)).unwrap_or(default)
}

/// Absent or malformed lists become empty, never null
pub fn string_list(raw: &Value, aliases: &[&str]) -> Vec<String> {
    pick(raw, aliases)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(coerce_string).collect())
        .unwrap_or_default()
}

/// Collapse the four accepted image shapes into a flat list of URL strings:
/// a single URL string, an array of strings, an array of media objects
/// (`url`/`filename`/`file`), or a keyed object whose values are strings.
/// The output may be empty; callers decide whether to substitute the
/// placeholder.
pub fn normalize_images(raw: &Value) -> Vec<String> {
    match raw {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Object(_) => media_object_url(item),
                _ => None,
            })
            .collect(),
        Value::Object(map) => {
            if let Some(url) = media_object_url(raw) {
                return vec![url];
            }
            // Relies on serde_json's preserve_order feature: the first entry
            // in the payload stays first and remains the cover image.
            map.values()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
        _ => Vec::new(),
    }
}

fn media_object_url(item: &Value) -> Option<String> {
    for key in ["url", "filename", "file"] {
        if let Some(url) = item.get(key).and_then(Value::as_str) {
            if !url.is_empty() {
                return Some(url.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_unwraps_bare_array_and_wrapper_keys() {
        assert_eq!(unwrap_collection(&json!([1, 2])).unwrap().len(), 2);
        for key in WRAPPER_KEYS {
            let wrapped = json!({ *key: [1] });
            assert_eq!(unwrap_collection(&wrapped).unwrap().len(), 1, "key {key}");
        }
        assert!(unwrap_collection(&json!({"other": [1]})).is_none());
        assert!(unwrap_collection(&json!("nope")).is_none());
    }

    #[test]
    fn images_from_single_string() {
        assert_eq!(normalize_images(&json!("/a.jpg")), vec!["/a.jpg"]);
    }

    #[test]
    fn images_from_string_array() {
        assert_eq!(normalize_images(&json!(["/a.jpg", "/b.jpg"])), vec!["/a.jpg", "/b.jpg"]);
    }

    #[test]
    fn images_from_media_object_array() {
        let raw = json!([
            {"id": 1, "url": "/a.jpg"},
            {"id": 2, "filename": "/b.jpg"},
            {"id": 3, "file": "/c.jpg"},
            {"id": 4}
        ]);
        assert_eq!(normalize_images(&raw), vec!["/a.jpg", "/b.jpg", "/c.jpg"]);
    }

    #[test]
    fn images_from_keyed_object() {
        let raw = json!({"main": "/a.jpg", "side": "/b.jpg"});
        assert_eq!(normalize_images(&raw), vec!["/a.jpg", "/b.jpg"]);
    }

    #[test]
    fn keyed_object_keeps_source_order_for_cover() {
        // Key names must not reorder the list; the first entry is the cover.
        let raw = json!({"zmain": "/cover.jpg", "aextra": "/extra.jpg"});
        assert_eq!(normalize_images(&raw), vec!["/cover.jpg", "/extra.jpg"]);
    }

    #[test]
    fn images_from_unusable_input_are_empty() {
        assert!(normalize_images(&json!(null)).is_empty());
        assert!(normalize_images(&json!(42)).is_empty());
        assert!(normalize_images(&json!([null, 7])).is_empty());
    }

    #[test]
    fn bool_coercion_accepts_numeric_and_string_forms() {
        assert_eq!(coerce_bool(&json!(1)), Some(true));
        assert_eq!(coerce_bool(&json!(0)), Some(false));
        assert_eq!(coerce_bool(&json!("1")), Some(true));
        assert_eq!(coerce_bool(&json!("true")), Some(true));
        assert_eq!(coerce_bool(&json!(true)), Some(true));
        assert_eq!(coerce_bool(&json!("yes")), None);
    }

    #[test]
    fn numeric_coercion_accepts_strings() {
        assert_eq!(coerce_i64(&json!("42")), Some(42));
        assert_eq!(coerce_i64(&json!(42.9)), Some(42));
        assert_eq!(coerce_f64(&json!("4.5")), Some(4.5));
        assert_eq!(coerce_f64(&json!("")), None);
    }
}
