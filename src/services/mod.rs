pub mod admin;
pub mod auth;
pub mod cars;
pub mod favorites;
pub mod messages;
pub mod reviews;

pub use admin::AdminService;
pub use auth::AuthService;
pub use cars::CarService;
pub use favorites::FavoritesService;
pub use messages::MessageService;
pub use reviews::ReviewService;

use chrono::Utc;

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
