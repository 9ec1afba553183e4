use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::core::RoomManager;
use crate::middleware::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub room_manager: Arc<RwLock<RoomManager>>,
    pub secret_key: String,
    pub public_url: String,
    pub config: Arc<AppConfig>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            room_manager: Arc::new(RwLock::new(RoomManager::new(config.round.clone()))),
            secret_key: config.secret_key.clone(),
            public_url: config.public_url.clone(),
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }
}
