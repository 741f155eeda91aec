use std::sync::Arc;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::file_tier::FileBridgeTier;
use crate::cache::memory_tier::MemoryTier;
use crate::cache::redis_tier::RedisTier;
use crate::cache::tier::{CacheEnvelope, CacheTier, TierHit};

const REDIS_KEY_PREFIX: &str = "market_pulse";

/// 多级缓存存储
///
/// 读取按层级顺序探测，第一个未过期命中即返回；单层IO失败按该层miss
/// 处理并记录日志，绝不向调用方抛出。写入穿透全部层级，各层失败互不影响。
pub struct TierStore {
    tiers: Vec<Arc<dyn CacheTier>>,
}

impl TierStore {
    pub fn new(tiers: Vec<Arc<dyn CacheTier>>) -> Self {
        Self { tiers }
    }

    /// 标准三级：进程内 + Redis + 文件桥
    pub fn with_default_tiers() -> Self {
        Self::new(vec![
            Arc::new(MemoryTier::new()) as Arc<dyn CacheTier>,
            Arc::new(RedisTier::new(REDIS_KEY_PREFIX.to_string())),
            Arc::new(FileBridgeTier::from_env()),
        ])
    }

    /// 读取：由快到慢探测，返回第一个未过期命中
    ///
    /// 过期条目视为该层miss，继续向下层探测。慢层命中时回填到更快的
    /// 层级，信封原样写入（保留原written_at，回填不会伪造新鲜度）。
    pub async fn get(&self, key: &str) -> Option<TierHit<Value>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            match tier.get(key).await {
                Ok(Some(envelope)) => {
                    if envelope.is_expired() {
                        debug!("tier {} 命中但已过期: {}", tier.kind(), key);
                        continue;
                    }
                    let age_seconds = envelope.age_seconds();
                    debug!(
                        "cache hit: key={} tier={} age={}s",
                        key,
                        tier.kind(),
                        age_seconds
                    );

                    for faster in &self.tiers[..index] {
                        if let Err(e) = faster.set(key, &envelope).await {
                            warn!("tier {} 回填失败: key={}: {}", faster.kind(), key, e);
                        }
                    }

                    return Some(TierHit {
                        value: envelope.value,
                        tier: tier.kind(),
                        age_seconds,
                        expired: false,
                    });
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("tier {} 读取失败，降级到下一层: {}", tier.kind(), e);
                    continue;
                }
            }
        }
        debug!("cache miss: {}", key);
        None
    }

    /// 读取（含过期值）：优先返回未过期命中，否则返回各层中最新的过期值
    ///
    /// 供降级响应取"最后一次已知值"使用。
    pub async fn get_any(&self, key: &str) -> Option<TierHit<Value>> {
        let mut best_stale: Option<(i64, TierHit<Value>)> = None;

        for tier in &self.tiers {
            match tier.get(key).await {
                Ok(Some(envelope)) => {
                    let age_seconds = envelope.age_seconds();
                    if !envelope.is_expired() {
                        return Some(TierHit {
                            value: envelope.value,
                            tier: tier.kind(),
                            age_seconds,
                            expired: false,
                        });
                    }
                    let newer = best_stale
                        .as_ref()
                        .map(|(written_at, _)| envelope.written_at > *written_at)
                        .unwrap_or(true);
                    if newer {
                        best_stale = Some((
                            envelope.written_at,
                            TierHit {
                                value: envelope.value,
                                tier: tier.kind(),
                                age_seconds,
                                expired: true,
                            },
                        ));
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("tier {} 读取失败，降级到下一层: {}", tier.kind(), e);
                    continue;
                }
            }
        }
        best_stale.map(|(_, hit)| hit)
    }

    /// 写入：同一信封穿透全部层级，返回成功写入的层数
    ///
    /// 部分层失败只记日志；最快层写入成功后，后续读取即可见。
    pub async fn set(&self, key: &str, value: Value, ttl_seconds: u64) -> usize {
        let envelope = CacheEnvelope::new(value, ttl_seconds);

        let writes = self.tiers.iter().map(|tier| {
            let envelope = &envelope;
            async move { (tier.kind(), tier.set(key, envelope).await) }
        });

        let mut written = 0;
        for (kind, result) in join_all(writes).await {
            match result {
                Ok(()) => written += 1,
                Err(e) => warn!("tier {} 写入失败: key={}: {}", kind, key, e),
            }
        }
        debug!("cache set: key={} ttl={}s tiers={}", key, ttl_seconds, written);
        written
    }

    /// 序列化后写入
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> usize {
        match serde_json::to_value(value) {
            Ok(v) => self.set(key, v, ttl_seconds).await,
            Err(e) => {
                warn!("缓存值序列化失败: key={}: {}", key, e);
                0
            }
        }
    }

    /// 读取并反序列化为具体类型
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<TierHit<T>> {
        self.get(key).await.and_then(TierHit::decode)
    }

    /// 读取（含过期值）并反序列化
    pub async fn get_any_json<T: DeserializeOwned>(&self, key: &str) -> Option<TierHit<T>> {
        self.get_any(key).await.and_then(TierHit::decode)
    }
}
