use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::Car;

/// Storage keys. One JSON file per key under the store directory.
pub mod keys {
    /// Persisted session record
    pub const SESSION: &str = "user";
    /// Time-boxed local listing cache
    pub const CARS: &str = "autonorte_cars";
    /// Demo message store
    pub const MESSAGES: &str = "tuautonorte_messages";
    /// Offline review store
    pub const REVIEWS: &str = "autonorte_reviews";
    /// Blocked user ids (advisory, client-local)
    pub const BLOCKED_USERS: &str = "blocked_users";
    /// Flag records, at most one per user id
    pub const FLAGGED_USERS: &str = "flagged_users";

    /// Favorites are kept per user, with a shared guest bucket
    pub fn favorites(user_id: Option<i64>) -> String {
        match user_id {
            Some(id) => format!("favorites_{id}"),
            None => "favorites_guest".to_string(),
        }
    }
}

/// Locally created listings expire after this long; backend-origin listings
/// are not subject to expiry.
pub const CAR_CACHE_TTL_MILLIS: i64 = 2 * 60 * 60 * 1000;

/// Typed key-value store over a directory of JSON files.
///
/// This is the durable client-side state that survives restarts without a
/// backend. Corrupt or missing files read as `None`; writes are
/// last-write-wins with no locking across concurrent writers.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read and decode a key. Any failure (missing file, bad JSON, schema
    /// drift) reads as `None` rather than an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = fs::read_to_string(self.path(key)).ok()?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!("Discarding unreadable store entry '{}': {}", key, err);
                None
            }
        }
    }

    /// Read a key as raw JSON, for shapes not owned by this crate
    /// (e.g. session records written by older client versions).
    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.get(key)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(err) = self.try_set(key, value) {
            warn!("Failed to persist store entry '{}': {}", key, err);
        }
    }

    fn try_set<T: Serialize>(&self, key: &str, value: &T) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.path(key), json)
    }

    pub fn remove(&self, key: &str) {
        let path = self.path(key);
        if path.exists() {
            let _ = fs::remove_file(&path);
        }
    }

    /// Listing cache read: drops entries older than two hours (by their
    /// local creation timestamp) and rewrites the file when anything
    /// expired. Entries without a timestamp came from the backend and are
    /// kept as-is.
    pub fn stored_cars(&self, now_millis: i64) -> Vec<Car> {
        let cars: Vec<Car> = self.get(keys::CARS).unwrap_or_default();
        let kept: Vec<Car> = cars
            .iter()
            .filter(|car| match car.created_at_timestamp {
                Some(created) => now_millis - created < CAR_CACHE_TTL_MILLIS,
                None => true,
            })
            .cloned()
            .collect();

        if kept.len() != cars.len() {
            debug!("Expired {} cached listings", cars.len() - kept.len());
            self.set(keys::CARS, &kept);
        }

        kept
    }

    pub fn push_car(&self, car: Car, now_millis: i64) {
        let mut cars = self.stored_cars(now_millis);
        cars.push(car);
        self.set(keys::CARS, &cars);
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
