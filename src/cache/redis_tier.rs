use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use crate::app_config::redis::get_redis_connection;
use crate::cache::tier::{
    CacheEnvelope, CacheError, CacheTier, TierKind, STALE_RETENTION_FACTOR,
};

/// Redis共享缓存（tier 2）
///
/// 信封整体序列化为JSON字符串存储。物理过期EX设为 ttl * 保留倍数，
/// 只作兜底，逻辑过期仍由信封时间戳在读取时判定。
pub struct RedisTier {
    key_prefix: String,
}

impl RedisTier {
    pub fn new(key_prefix: String) -> Self {
        Self { key_prefix }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheTier for RedisTier {
    fn kind(&self) -> TierKind {
        TierKind::Redis
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEnvelope<Value>>, CacheError> {
        let mut conn = get_redis_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let redis_key = self.make_key(key);

        let payload: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        match payload {
            Some(s) => {
                let envelope: CacheEnvelope<Value> = serde_json::from_str(&s)?;
                debug!("redis get hit: {}", redis_key);
                Ok(Some(envelope))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, envelope: &CacheEnvelope<Value>) -> Result<(), CacheError> {
        let mut conn = get_redis_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let redis_key = self.make_key(key);
        let payload = serde_json::to_string(envelope)?;

        let retention_secs = envelope
            .ttl_seconds
            .saturating_mul(STALE_RETENTION_FACTOR)
            .max(1);

        let _: () = conn
            .set_ex(redis_key, payload, retention_secs)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
