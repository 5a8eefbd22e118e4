use serde_json::Value;
use tracing::{debug, warn};

use crate::http::{ApiRequest, Transport};

/// Try an ordered list of candidate requests until one yields a usable
/// result.
///
/// The deployed backend's routing convention is not reliably known, so every
/// operation lists the plausible routes and takes the first response that
/// `parse` can interpret. A candidate that fails in transport or returns an
/// uninterpretable shape is skipped, never retried; candidates are alternate
/// routes, not retries, so there is no backoff and the order is fixed by
/// declaration. `None` means every candidate was exhausted and the caller's
/// fallback takes over.
pub async fn resolve_first<T, F>(
    transport: &dyn Transport,
    candidates: &[ApiRequest],
    parse: F,
) -> Option<T>
where
    F: Fn(&Value) -> Option<T>,
{
    for req in candidates {
        match transport.execute(req).await {
            Ok(raw) => match parse(&raw) {
                Some(value) => {
                    debug!("Resolved via {} {}", req.method, req.path);
                    return Some(value);
                }
                None => {
                    warn!("Uninterpretable shape from {}, trying next candidate", req.path);
                }
            },
            Err(err) => {
                debug!("Candidate {} failed ({}), trying next", req.path, err);
            }
        }
    }
    None
}
