use crate::error::app_error::AppError;
use crate::models::session::{SessionBundle, SessionId};
use crate::store::SessionRepository;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use rocket::serde::json::serde_json;

/// Session store backed by Redis. Keys expire together with the access token.
#[derive(Clone)]
pub struct RedisSessionRepository {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisSessionRepository {
    pub async fn connect(url: &str, key_prefix: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self {
            connection,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, id: &SessionId) -> String {
        session_key(&self.key_prefix, id)
    }
}

fn session_key(prefix: &str, id: &SessionId) -> String {
    format!("{}{}", prefix, id)
}

#[async_trait::async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionBundle>, AppError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(self.key(id)).await?;

        match raw {
            Some(raw) => {
                let bundle = serde_json::from_str(&raw).map_err(|e| AppError::session_store("Corrupt session entry", e))?;
                Ok(Some(bundle))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, id: &SessionId, bundle: &SessionBundle) -> Result<(), AppError> {
        let payload = serde_json::to_string(bundle).map_err(|e| AppError::session_store("Failed to encode session", e))?;
        let ttl = bundle.token.remaining_seconds(Utc::now()).max(1);

        let mut connection = self.connection.clone();
        let _: () = connection.set_ex(self.key(id), payload, ttl).await?;
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), AppError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(self.key(id)).await?;
        Ok(())
    }
}
