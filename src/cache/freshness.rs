use tracing::debug;

use crate::cache::tier::TierHit;

/// 内容质量检查
///
/// TTL判断不了"从未成功写入"的空壳值：后台写入进程启动即崩溃时，
/// 缓存里会留下看似新鲜、实则全零的条目。各快照类型自行定义占位判定。
pub trait ContentQuality {
    /// 核心数值字段全部为零/缺失时为占位值
    fn is_placeholder(&self) -> bool;
}

/// 新鲜度判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessDecision {
    /// 可直接使用
    Usable,
    /// 任何层级都没有
    Miss,
    /// 找到但已超过TTL
    Expired,
    /// 找到且未过期，但内容是占位值
    Placeholder,
}

/// 判定一次缓存查询结果是否可用
///
/// 不可用的三种情况：miss、过期、占位值。占位值无论多新鲜都拒绝。
pub fn classify<T: ContentQuality>(hit: Option<&TierHit<T>>) -> FreshnessDecision {
    match hit {
        None => FreshnessDecision::Miss,
        Some(h) if h.expired => FreshnessDecision::Expired,
        Some(h) if h.value.is_placeholder() => FreshnessDecision::Placeholder,
        Some(_) => FreshnessDecision::Usable,
    }
}

pub fn is_usable<T: ContentQuality>(hit: Option<&TierHit<T>>) -> bool {
    let decision = classify(hit);
    if decision != FreshnessDecision::Usable {
        debug!("缓存值不可用: {:?}", decision);
    }
    decision == FreshnessDecision::Usable
}
