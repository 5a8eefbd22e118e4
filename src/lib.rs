//! Typed client for the TuAutoNorte marketplace backend.
//!
//! The deployed backend's routing scheme and response shapes are not firmly
//! contracted, so every operation probes an ordered list of candidate
//! endpoints, normalizes whatever shape comes back into canonical models,
//! and falls back to a local persistent store when nothing answers. The
//! design goal is "always show something": reads never surface transport
//! errors, only validation failures and backend-authoritative writes do.

pub mod error;
pub mod http;
pub mod models;
pub mod normalize;
pub mod resolve;
pub mod services;
pub mod store;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use http::{HttpTransport, Transport};
use services::{
    AdminService, AuthService, CarService, FavoritesService, MessageService, ReviewService,
};
use store::LocalStore;

/// All services wired to one transport and one local store
pub struct MarketplaceClient {
    pub auth: AuthService,
    pub cars: CarService,
    pub messages: MessageService,
    pub reviews: ReviewService,
    pub admin: AdminService,
    pub favorites: FavoritesService,
}

impl MarketplaceClient {
    /// Connect to a backend base URL, persisting client-local state under
    /// `data_dir`
    pub fn new(base_url: &str, data_dir: &Path) -> Result<Self> {
        let store = Arc::new(LocalStore::new(data_dir));
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(base_url, store.clone())?);
        Ok(Self::with_transport(transport, store))
    }

    /// Wire the services to an arbitrary transport (used by tests)
    pub fn with_transport(transport: Arc<dyn Transport>, store: Arc<LocalStore>) -> Self {
        Self {
            auth: AuthService::new(transport.clone(), store.clone()),
            cars: CarService::new(transport.clone(), store.clone()),
            messages: MessageService::new(transport.clone(), store.clone()),
            reviews: ReviewService::new(transport.clone(), store.clone()),
            admin: AdminService::new(transport, store.clone()),
            favorites: FavoritesService::new(store),
        }
    }
}
