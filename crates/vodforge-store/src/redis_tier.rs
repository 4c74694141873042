//! Redis durable tier.
//!
//! Key namespace:
//! - `<prefix>:job:<job_id>` — the serialized job record
//! - `<prefix>:user:<user_id>:jobs` — the set of the user's job ids
//!
//! Both keys expire with the processed-artifact retention TTL; the
//! user set's expiry is refreshed on every write so it outlives the
//! user's most recent job.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use vodforge_models::{VideoJob, VideoJobId};

use crate::error::StoreResult;
use crate::store::DurableTier;

/// Redis tier configuration.
#[derive(Debug, Clone)]
pub struct RedisTierConfig {
    /// Redis URL
    pub redis_url: String,
    /// Key prefix
    pub key_prefix: String,
}

impl Default for RedisTierConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "vodforge".to_string(),
        }
    }
}

impl RedisTierConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "vodforge".to_string()),
        }
    }
}

/// Durable tier backed by Redis.
pub struct RedisTier {
    client: redis::Client,
    config: RedisTierConfig,
}

impl RedisTier {
    /// Create a new Redis tier.
    pub fn new(config: RedisTierConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(RedisTierConfig::from_env())
    }

    fn job_key(&self, id: &VideoJobId) -> String {
        format!("{}:job:{}", self.config.key_prefix, id)
    }

    fn user_key(&self, user_id: &str) -> String {
        format!("{}:user:{}:jobs", self.config.key_prefix, user_id)
    }
}

#[async_trait]
impl DurableTier for RedisTier {
    async fn put(&self, job: &VideoJob, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.job_key(&job.id), payload, ttl_secs)
            .await?;

        let user_key = self.user_key(&job.user_id);
        conn.sadd::<_, _, ()>(&user_key, job.id.as_str()).await?;
        conn.expire::<_, ()>(&user_key, ttl_secs as i64).await?;

        debug!(job_id = %job.id, "Wrote job record to durable tier");
        Ok(())
    }

    async fn get(&self, id: &VideoJobId) -> StoreResult<Option<VideoJob>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload: Option<String> = conn.get(self.job_key(id)).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn list_ids_by_user(&self, user_id: &str) -> StoreResult<Vec<VideoJobId>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let ids: Vec<String> = conn.smembers(self.user_key(user_id)).await?;
        Ok(ids.into_iter().map(VideoJobId::from).collect())
    }

    async fn delete(&self, id: &VideoJobId) -> StoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Fetch first so the user set can be cleaned up too.
        let payload: Option<String> = conn.get(self.job_key(id)).await?;
        if let Some(json) = payload {
            if let Ok(job) = serde_json::from_str::<VideoJob>(&json) {
                conn.srem::<_, _, ()>(self.user_key(&job.user_id), id.as_str())
                    .await?;
            }
        }
        conn.del::<_, ()>(self.job_key(id)).await?;
        Ok(())
    }
}
