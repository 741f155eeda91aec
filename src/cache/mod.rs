//! # 多级缓存
//!
//! 进程内(DashMap) / Redis共享 / 跨进程文件桥 三级缓存，
//! 写入穿透全部层级，读取按由快到慢探测，过期在读取时惰性判定。

pub mod file_tier;
pub mod freshness;
pub mod memory_tier;
pub mod redis_tier;
pub mod tier;
pub mod tier_store;

pub use file_tier::FileBridgeTier;
pub use freshness::{classify, is_usable, ContentQuality, FreshnessDecision};
pub use memory_tier::MemoryTier;
pub use redis_tier::RedisTier;
pub use tier::{CacheEnvelope, CacheError, CacheTier, TierHit, TierKind};
pub use tier_store::TierStore;
