pub mod memory;
pub mod redis_store;

use crate::config::{SessionBackend, SessionConfig};
use crate::error::app_error::AppError;
use crate::models::session::{SessionBundle, SessionId};
use rocket::fairing::AdHoc;
use std::sync::Arc;

/// Persistence for established sessions, keyed by the id in the session cookie.
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionBundle>, AppError>;
    async fn set(&self, id: &SessionId, bundle: &SessionBundle) -> Result<(), AppError>;
    async fn clear(&self, id: &SessionId) -> Result<(), AppError>;
}

pub type SharedSessions = Arc<dyn SessionRepository>;

async fn init_store(config: &SessionConfig) -> Result<SharedSessions, AppError> {
    match config.backend {
        SessionBackend::Memory => {
            let store = Arc::new(memory::MemorySessionRepository::default());
            store.clone().spawn_cleanup_task(config.cleanup_interval_seconds);
            Ok(store)
        }
        SessionBackend::Redis => {
            let store = redis_store::RedisSessionRepository::connect(&config.redis_url, &config.key_prefix).await?;
            Ok(Arc::new(store))
        }
    }
}

pub fn stage_sessions(config: SessionConfig) -> AdHoc {
    AdHoc::try_on_ignite("Session store", |rocket| async move {
        match init_store(&config).await {
            Ok(store) => {
                tracing::info!(backend = ?config.backend, "Session store initialized");
                Ok(rocket.manage(store))
            }
            Err(e) => {
                tracing::error!("Failed to initialize session store: {}", e);
                Err(rocket)
            }
        }
    })
}
