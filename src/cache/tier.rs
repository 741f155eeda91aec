use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::time_util;

/// 物理保留倍数：逻辑TTL过期后，底层存储继续保留数据一段时间，
/// 供降级响应读取"最后一次已知值"。逻辑过期始终以信封时间戳为准。
pub const STALE_RETENTION_FACTOR: u64 = 5;

/// 缓存层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierKind {
    /// 进程内缓存 (tier 1)
    Memory,
    /// Redis共享缓存 (tier 2)
    Redis,
    /// 跨进程文件桥 (tier 3)
    FileBridge,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Memory => "memory",
            TierKind::Redis => "redis",
            TierKind::FileBridge => "file_bridge",
        }
    }
}

impl std::fmt::Display for TierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 缓存信封：值 + 写入时间 + TTL
///
/// 时间戳随值一起序列化存储，跨进程、跨重启后年龄仍可判定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    pub value: T,
    /// 写入时间，Unix时间戳毫秒
    pub written_at: i64,
    /// 过期预算（秒）
    pub ttl_seconds: u64,
}

impl<T> CacheEnvelope<T> {
    pub fn new(value: T, ttl_seconds: u64) -> Self {
        Self {
            value,
            written_at: time_util::now_millis(),
            ttl_seconds,
        }
    }

    /// 距写入的秒数
    pub fn age_seconds(&self) -> u64 {
        time_util::age_seconds(self.written_at)
    }

    /// 逻辑过期：age > ttl
    pub fn is_expired(&self) -> bool {
        self.age_seconds() > self.ttl_seconds
    }

    /// 物理可清除：超过保留窗口，连降级响应也不再需要
    pub fn is_evictable(&self) -> bool {
        self.age_seconds() > self.ttl_seconds.saturating_mul(STALE_RETENTION_FACTOR)
    }
}

/// 单层缓存读写失败
///
/// 所有变体都由 TierStore 吸收：记录日志后当作该层miss处理，不向调用方传播。
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("缓存层不可用: {0}")]
    Unavailable(String),

    #[error("缓存序列化失败: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serde(err.to_string())
    }
}

/// 单层缓存接口
///
/// 各层只负责存取信封，不做过期判定（过期逻辑统一在 TierStore），
/// 仅在超过物理保留窗口时自行清除。
#[async_trait]
pub trait CacheTier: Send + Sync {
    fn kind(&self) -> TierKind;

    async fn get(&self, key: &str) -> Result<Option<CacheEnvelope<Value>>, CacheError>;

    async fn set(&self, key: &str, envelope: &CacheEnvelope<Value>) -> Result<(), CacheError>;
}

/// 命中结果：值、命中层级、年龄、是否已逻辑过期
#[derive(Debug, Clone)]
pub struct TierHit<T> {
    pub value: T,
    pub tier: TierKind,
    pub age_seconds: u64,
    pub expired: bool,
}

impl TierHit<Value> {
    /// 反序列化为具体类型，失败返回None（按miss处理）
    pub fn decode<T: DeserializeOwned>(self) -> Option<TierHit<T>> {
        match serde_json::from_value::<T>(self.value) {
            Ok(value) => Some(TierHit {
                value,
                tier: self.tier,
                age_seconds: self.age_seconds,
                expired: self.expired,
            }),
            Err(e) => {
                tracing::warn!("缓存值反序列化失败, tier={}: {}", self.tier, e);
                None
            }
        }
    }
}
