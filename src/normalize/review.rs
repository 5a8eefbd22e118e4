use serde_json::Value;

use crate::models::{Review, ReviewSummary, ReviewsResponse};

use super::{bool_field, coerce_f64, i64_field, opt_str_field, pick, unwrap_collection};

pub fn normalize_review(raw: &Value) -> Review {
    Review {
        id: i64_field(raw, &["id", "review_id", "reviewId"], 0),
        car_id: i64_field(raw, &["car_id", "carId"], 0),
        user_id: i64_field(raw, &["user_id", "userId"], 0),
        rating: i64_field(raw, &["rating"], 0),
        comment: opt_str_field(raw, &["comment"]),
        created_at: opt_str_field(raw, &["created_at", "createdAt"]),
        user_name: opt_str_field(raw, &["user_name", "userName", "username"]),
    }
}

/// Summary fields come back as numbers, numeric strings, empty strings or
/// nulls; coerce to numbers where possible and keep null otherwise.
pub fn normalize_summary(raw: Option<&Value>) -> ReviewSummary {
    let Some(raw) = raw else {
        return ReviewSummary::default();
    };
    ReviewSummary {
        avg_rating: pick(raw, &["avg_rating", "avgRating"]).and_then(|v| coerce_f64(v)),
        score_10: pick(raw, &["score_10", "score10"]).and_then(|v| coerce_f64(v)),
        total: pick(raw, &["total"])
            .and_then(|v| coerce_f64(v))
            .map(|n| n.max(0.0) as u64)
            .unwrap_or(0),
    }
}

/// Interpret a reviews-for-car response. Accepts a bare review array or an
/// object carrying `reviews`/`summary`/`ok`; anything else is
/// uninterpretable and the resolver moves on.
pub fn normalize_reviews_response(raw: &Value) -> Option<ReviewsResponse> {
    if let Some(arr) = raw.as_array() {
        return Some(ReviewsResponse {
            ok: true,
            summary: ReviewSummary::default(),
            reviews: arr.iter().map(normalize_review).collect(),
        });
    }

    let obj = raw.as_object()?;
    if !obj.contains_key("reviews") && !obj.contains_key("ok") && !obj.contains_key("summary") {
        return None;
    }

    let reviews = pick(raw, &["reviews"])
        .and_then(unwrap_review_list)
        .or_else(|| unwrap_collection(raw))
        .unwrap_or_default()
        .iter()
        .map(normalize_review)
        .collect();

    Some(ReviewsResponse {
        ok: bool_field(raw, &["ok", "success"], true),
        summary: normalize_summary(raw.get("summary")),
        reviews,
    })
}

fn unwrap_review_list(raw: &Value) -> Option<Vec<Value>> {
    raw.as_array().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_coerces_strings_and_empties() {
        let summary = normalize_summary(Some(&json!({
            "avg_rating": "4.5",
            "score_10": "",
            "total": "3"
        })));
        assert_eq!(summary.avg_rating, Some(4.5));
        assert_eq!(summary.score_10, None);
        assert_eq!(summary.total, 3);

        let summary = normalize_summary(Some(&json!({"avg_rating": null})));
        assert_eq!(summary.avg_rating, None);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn response_accepts_bare_array() {
        let resp = normalize_reviews_response(&json!([{"id": 1, "rating": 5}])).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.reviews.len(), 1);
        assert_eq!(resp.reviews[0].rating, 5);
    }

    #[test]
    fn response_accepts_envelope_object() {
        let resp = normalize_reviews_response(&json!({
            "ok": true,
            "summary": {"avg_rating": 4.0, "score_10": 8.0, "total": 2},
            "reviews": [{"id": 1, "carId": 3, "userId": 9, "rating": 4}]
        }))
        .unwrap();
        assert_eq!(resp.summary.score_10, Some(8.0));
        assert_eq!(resp.reviews[0].car_id, 3);
        assert_eq!(resp.reviews[0].user_id, 9);
    }

    #[test]
    fn unknown_shape_is_uninterpretable() {
        assert!(normalize_reviews_response(&json!({"weird": 1})).is_none());
        assert!(normalize_reviews_response(&json!("nope")).is_none());
    }
}
