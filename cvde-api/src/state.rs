use std::sync::Arc;

use cvde_core::repository::{CatalogStore, FaqStore, OrderRepository, ProfileStore, SettingsStore};
use cvde_shared::OrderChangedEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderRepository>,
    pub profiles: Arc<dyn ProfileStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub faq: Arc<dyn FaqStore>,
    pub order_feed: broadcast::Sender<OrderChangedEvent>,
    pub auth: AuthConfig,
}
