use crate::error::app_error::AppError;
use crate::models::session::{SessionBundle, SessionId};
use crate::store::SessionRepository;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local session store. Sessions do not survive a restart.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, SessionBundle>>,
}

impl MemorySessionRepository {
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session whose token expired at or before `now`. Returns how many went.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, bundle| !bundle.token.is_expired(now));
        before - sessions.len()
    }

    pub fn spawn_cleanup_task(self: Arc<Self>, interval_seconds: u64) {
        let cleanup_interval = Duration::from_secs(interval_seconds.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired(Utc::now()).await;
                if purged > 0 {
                    let remaining = self.len().await;
                    debug!(purged, remaining, "dropped expired sessions");
                }
            }
        });
    }
}

#[async_trait::async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionBundle>, AppError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn set(&self, id: &SessionId, bundle: &SessionBundle) -> Result<(), AppError> {
        self.sessions.write().await.insert(*id, bundle.clone());
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), AppError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
