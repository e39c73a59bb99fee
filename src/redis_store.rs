//! [`Store`] implementation over a pooled Redis connection, following the
//! `bb8` + `redis` pattern used by the Redis backend in the reference
//! pack's `omniqueue-rs` example (`producer.redis.get().await?.lpush(...)`).

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::Store;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;

/// A [`Store`] backed by a `bb8`-pooled `redis` connection manager.
///
/// Cloning is cheap: the pool itself is reference-counted internally by
/// `bb8`.
#[derive(Clone)]
pub struct RedisStore {
    pool: bb8::Pool<RedisConnectionManager>,
}

impl RedisStore {
    /// Connects to the Redis-compatible server described by `config`.
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let manager = RedisConnectionManager::new(config.redis_url.as_str())?;
        let pool = bb8::Pool::builder()
            .max_size(config.max_pool_size)
            .connection_timeout(config.connect_timeout)
            .build(manager)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an already-built pool, for callers that need custom pool
    /// tuning beyond [`StoreConfig`].
    pub fn from_pool(pool: bb8::Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }
}

impl Store for RedisStore {
    async fn append_left(&self, list: &str, payloads: Vec<Vec<u8>>) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.lpush(list, payloads).await?;
        Ok(())
    }

    async fn pop_right_push_left(
        &self,
        src: &str,
        dst: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.pool.get().await?;
        let payload: Option<Vec<u8>> = conn.rpoplpush(src, dst).await?;
        Ok(payload)
    }

    async fn pop_right(&self, list: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.pool.get().await?;
        let payload: Option<Vec<u8>> = conn.rpop(list, None).await?;
        Ok(payload)
    }

    async fn length(&self, list: &str) -> Result<u64, StoreError> {
        let mut conn = self.pool.get().await?;
        let len: u64 = conn.llen(list).await?;
        Ok(len)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.sadd(set, member).await?;
        Ok(())
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.srem(set, member).await?;
        Ok(())
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let members: Vec<String> = conn.smembers(set).await?;
        Ok(members)
    }
}
