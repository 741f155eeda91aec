use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::cache::tier::{CacheEnvelope, CacheError, CacheTier, TierKind};

/// 进程内缓存（tier 1）
///
/// DashMap分片锁，单key写入原子，不同key并发互不阻塞。
/// 超过物理保留窗口的条目在读取时顺手清除。
pub struct MemoryTier {
    map: DashMap<String, CacheEnvelope<Value>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// 当前条目数（含已过期未清除的）
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn kind(&self) -> TierKind {
        TierKind::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEnvelope<Value>>, CacheError> {
        if let Some(entry) = self.map.get(key) {
            if entry.is_evictable() {
                drop(entry);
                self.map.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, envelope: &CacheEnvelope<Value>) -> Result<(), CacheError> {
        self.map.insert(key.to_string(), envelope.clone());
        Ok(())
    }
}
