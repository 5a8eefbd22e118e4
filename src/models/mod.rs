use serde::{Deserialize, Serialize};

/// Role attached to a session or an administered account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Moderation lifecycle of a listing.
///
/// `Rejected` is terminal: rejected listings leave the pending set and are
/// not revisited. An owner flag is separate metadata on the seller, not a
/// status transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Canonical vehicle listing after normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    /// Always a flat list of URLs, first element is the cover image
    pub images: Vec<String>,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub status: ModerationStatus,
    pub created_at: String,
    /// Epoch millis, set only on listings synthesized into the local cache.
    /// Backend-origin listings carry no timestamp and never expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_timestamp: Option<i64>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage: i64,
    pub fuel_type: String,
    pub transmission: String,
    pub engine: String,
    pub color: String,
    pub doors: i64,
    pub body_type: String,
    pub features: Vec<String>,
    pub issues: Vec<String>,
    pub payment_methods: Vec<String>,
    pub warranty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_details: Option<String>,
}

impl Car {
    pub fn is_approved(&self) -> bool {
        self.status == ModerationStatus::Approved
    }
}

/// An image file submitted with a new listing
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fields accepted when creating a listing; vehicle details are optional
/// and get placeholder defaults when absent
#[derive(Debug, Clone, Default)]
pub struct CreateCarData {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub images: Vec<ImageUpload>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub mileage: Option<i64>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub color: Option<String>,
    pub doors: Option<i64>,
    pub body_type: Option<String>,
    pub features: Option<Vec<String>>,
    pub issues: Option<Vec<String>>,
    pub payment_methods: Option<Vec<String>>,
    pub warranty: Option<bool>,
    pub warranty_details: Option<String>,
}

/// Result of creating a listing. Image uploads that failed after the listing
/// itself was created are a soft warning, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCarResult {
    pub id: i64,
    pub image_failures: u32,
}

/// Canonical message between two users about a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub from_user_id: i64,
    pub to_user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user_name: Option<String>,
    /// Weak reference to a listing, used only for grouping
    pub car_id: String,
    pub subject: String,
    pub content: String,
    /// Epoch millis
    pub timestamp: i64,
    pub read: bool,
}

#[derive(Debug, Clone)]
pub struct SendMessageData {
    pub to_user_id: i64,
    pub car_id: String,
    pub subject: String,
    pub content: String,
}

/// One review per user per car; a second review by the same user for the
/// same car replaces the first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub car_id: i64,
    pub user_id: i64,
    pub rating: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Per-car aggregate, computed server-side and type-coerced on this side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewSummary {
    pub avg_rating: Option<f64>,
    pub score_10: Option<f64>,
    pub total: u64,
}

impl Default for ReviewSummary {
    fn default() -> Self {
        Self { avg_rating: None, score_10: None, total: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewsResponse {
    pub ok: bool,
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

/// Account as seen by the admin panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub blocked: bool,
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
}

/// Moderation marker on a user. At most one per user id; flagging again
/// overwrites reason and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserFlag {
    /// The flagged user's id
    pub id: i64,
    pub reason: Option<String>,
    /// Epoch millis
    pub at: i64,
}

/// Authenticated session persisted for the duration of the client session,
/// destroyed at logout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileData {
    pub username: Option<String>,
    pub email: Option<String>,
}
