use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::http::{ApiRequest, Transport};
use crate::models::{Review, ReviewsResponse, ReviewSummary, Session};
use crate::normalize::{normalize_reviews_response, unwrap_collection};
use crate::normalize::normalize_review;
use crate::resolve::resolve_first;
use crate::store::{keys, LocalStore};
use crate::validate;

use super::now_millis;

/// Reviews for listings. Backend summaries are passed through with type
/// coercion; an in-memory per-car cache avoids duplicate requests when a
/// listing grid asks for many summaries at once.
pub struct ReviewService {
    transport: Arc<dyn Transport>,
    store: Arc<LocalStore>,
    cache: Mutex<HashMap<i64, ReviewsResponse>>,
}

impl ReviewService {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<LocalStore>) -> Self {
        Self { transport, store, cache: Mutex::new(HashMap::new()) }
    }

    pub async fn get_car_reviews(&self, car_id: i64, force: bool) -> ReviewsResponse {
        if !force {
            if let Some(cached) = self.cache.lock().unwrap().get(&car_id) {
                return cached.clone();
            }
        }

        let candidates = [
            ApiRequest::get(format!("/reviews/car/{car_id}")),
            ApiRequest::get(format!("/api/reviews/car/{car_id}")),
            ApiRequest::get(format!("/api/router.php?route=reviews&action=list&car_id={car_id}")),
        ];
        if let Some(response) =
            resolve_first(self.transport.as_ref(), &candidates, normalize_reviews_response).await
        {
            self.cache.lock().unwrap().insert(car_id, response.clone());
            return response;
        }

        debug!("Review endpoints unavailable for car {}, using local store", car_id);
        self.local_response(car_id)
    }

    /// Create or replace the caller's review of a car. At most one review
    /// per (user, car): a repeat call updates rating and comment instead of
    /// adding a duplicate.
    pub async fn create_or_update_review(
        &self,
        car_id: i64,
        rating: i64,
        comment: Option<String>,
    ) -> Result<()> {
        validate::validate_rating(rating)?;

        let body = json!({ "rating": rating, "comment": comment });
        let candidates = [
            ApiRequest::post(format!("/reviews/car/{car_id}"), body.clone()),
            ApiRequest::post(format!("/api/reviews/car/{car_id}"), body),
        ];
        if resolve_first(self.transport.as_ref(), &candidates, |_| Some(())).await.is_some() {
            self.cache.lock().unwrap().remove(&car_id);
            return Ok(());
        }

        warn!("Review endpoints unavailable, upserting review locally");
        let user_id = self
            .store
            .get::<Session>(keys::SESSION)
            .map(|s| s.id)
            .unwrap_or(0);
        let mut reviews = self.local_reviews();
        match reviews
            .iter_mut()
            .find(|r| r.user_id == user_id && r.car_id == car_id)
        {
            Some(existing) => {
                existing.rating = rating;
                existing.comment = comment;
            }
            None => reviews.push(Review {
                id: now_millis(),
                car_id,
                user_id,
                rating,
                comment,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                user_name: None,
            }),
        }
        self.store.set(keys::REVIEWS, &reviews);
        self.cache.lock().unwrap().remove(&car_id);
        Ok(())
    }

    /// Backend-authoritative delete; clears the whole cache on success
    pub async fn delete_review(&self, review_id: i64) -> Result<()> {
        let candidates = [
            ApiRequest::delete(format!("/reviews/{review_id}")),
            ApiRequest::delete(format!("/api/reviews/{review_id}")),
        ];
        resolve_first(self.transport.as_ref(), &candidates, |_| Some(()))
            .await
            .ok_or(Error::Unavailable("delete review"))?;
        self.cache.lock().unwrap().clear();
        Ok(())
    }

    /// Recent reviews for the admin panel, when the backend exposes them
    pub async fn get_recent_reviews(&self) -> Vec<Review> {
        let candidates = [ApiRequest::get("/admin/reviews")];
        let parse = |raw: &Value| {
            unwrap_collection(raw).map(|items| items.iter().map(normalize_review).collect())
        };
        resolve_first(self.transport.as_ref(), &candidates, parse)
            .await
            .unwrap_or_default()
    }

    fn local_reviews(&self) -> Vec<Review> {
        self.store.get(keys::REVIEWS).unwrap_or_default()
    }

    fn local_response(&self, car_id: i64) -> ReviewsResponse {
        let reviews: Vec<Review> = self
            .local_reviews()
            .into_iter()
            .filter(|r| r.car_id == car_id)
            .collect();
        let summary = if reviews.is_empty() {
            ReviewSummary::default()
        } else {
            let avg = reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64;
            ReviewSummary {
                avg_rating: Some(avg),
                score_10: Some(avg * 2.0),
                total: reviews.len() as u64,
            }
        };
        ReviewsResponse { ok: false, summary, reviews }
    }
}
