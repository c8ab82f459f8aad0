//! Anonymous session pincode storage (Redis)

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use super::SessionStore;
use crate::{
    error::{AppError, AppResult},
    models::pincode::{parse_stored, Pincode},
};

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Create the store; the connection is tested by [`SessionStore::ping`]
    pub fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(session_id: &str) -> String {
        format!("session:pincode:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_pincode(&self, session_id: &str) -> AppResult<Option<Pincode>> {
        let mut conn = self.connection().await?;
        let stored: Option<String> = conn
            .get(Self::key(session_id))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session pincode: {}", e)))?;
        Ok(parse_stored(stored))
    }

    async fn set_pincode(&self, session_id: &str, pincode: &Pincode) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(Self::key(session_id), pincode.as_str(), self.ttl_seconds)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store session pincode: {}", e)))?;
        Ok(())
    }

    async fn clear_pincode(&self, session_id: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(Self::key(session_id))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to clear session pincode: {}", e)))?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Redis connection test failed: {}", e)))?;
        Ok(())
    }
}
