use std::sync::Arc;

use crate::store::{keys, LocalStore};

/// Favorites are purely client-local: per-user buckets plus a shared guest
/// bucket, surviving restarts but not portable across devices.
pub struct FavoritesService {
    store: Arc<LocalStore>,
}

impl FavoritesService {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub fn favorites(&self, user_id: Option<i64>) -> Vec<i64> {
        self.store.get(&keys::favorites(user_id)).unwrap_or_default()
    }

    pub fn is_favorite(&self, user_id: Option<i64>, car_id: i64) -> bool {
        self.favorites(user_id).contains(&car_id)
    }

    /// Returns the new state: true when the listing is now a favorite
    pub fn toggle(&self, user_id: Option<i64>, car_id: i64) -> bool {
        let mut favorites = self.favorites(user_id);
        let added = if let Some(pos) = favorites.iter().position(|id| *id == car_id) {
            favorites.remove(pos);
            false
        } else {
            favorites.push(car_id);
            true
        };
        self.store.set(&keys::favorites(user_id), &favorites);
        added
    }
}
