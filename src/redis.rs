use crate::error::Result;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct RedisClient {
    manager: Arc<Mutex<ConnectionManager>>,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    // Rate limiting
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: u32,
        window_seconds: usize,
    ) -> Result<bool> {
        let mut conn = self.manager.lock().await;

        let current: u32 = conn.get(key).await.unwrap_or(0);

        if current >= limit {
            return Ok(false);
        }

        let _: () = conn.incr(key, 1).await?;
        let _: () = conn.expire(key, window_seconds as i64).await?;

        Ok(true)
    }

    // Opaque bearer tokens are issued by the external auth service and
    // stored under auth:{token}; this side only reads them.
    pub async fn get_auth_token(&self, token: &str) -> Result<Option<String>> {
        let mut conn = self.manager.lock().await;
        let key = format!("auth:{}", token);

        let payload: Option<String> = conn.get(key).await?;
        Ok(payload)
    }

    pub async fn delete_auth_token(&self, token: &str) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let key = format!("auth:{}", token);

        let _: () = conn.del(key).await?;
        Ok(())
    }

    // Caching
    pub async fn cache_set(&self, key: &str, value: &str, ttl_seconds: usize) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let _: () = conn.set_ex(key, value, ttl_seconds as u64).await?;
        Ok(())
    }

    pub async fn cache_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.lock().await;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn cache_delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
