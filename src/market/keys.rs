//! 缓存key命名空间与TTL策略
//!
//! key为扁平字符串，TTL随值存储在信封里，不编码进key。
//! 各key的TTL可通过环境变量覆盖代码默认值。

use crate::app_config::env::env_u64;

pub const MARKET_OVERVIEW: &str = "market:overview";
pub const MARKET_MOVERS: &str = "market:movers";
pub const ANALYSIS_SIGNALS: &str = "analysis:signals";

/// 单symbol共振分解key
pub fn confluence_breakdown_key(inst_id: &str) -> String {
    format!("confluence:breakdown:{}", inst_id)
}

/// 大盘概览TTL（秒）
pub fn overview_ttl_secs() -> u64 {
    env_u64("MARKET_OVERVIEW_TTL_SECS", 60)
}

/// 涨跌幅榜TTL（秒）
pub fn movers_ttl_secs() -> u64 {
    env_u64("MARKET_MOVERS_TTL_SECS", 60)
}

/// 信号TTL（秒）
pub fn signals_ttl_secs() -> u64 {
    env_u64("ANALYSIS_SIGNALS_TTL_SECS", 120)
}

/// 共振分解TTL（秒）
pub fn confluence_ttl_secs() -> u64 {
    env_u64("CONFLUENCE_TTL_SECS", 300)
}
