/// Errors surfaced by the service layer.
///
/// Transport and shape errors are swallowed internally by the endpoint
/// resolver; callers only see them as `Unavailable` on operations that are
/// backend-authoritative and have no local fallback. `Validation` propagates
/// directly so the caller can show it inline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
