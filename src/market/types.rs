use serde::{Deserialize, Serialize};

use crate::cache::{ContentQuality, TierKind};

/// 归一化后的单symbol行情记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRecord {
    pub inst_id: String,
    pub inst_type: String,
    pub last_price: f64,
    /// 24小时涨跌幅（百分比）
    pub change_pct_24h: f64,
    /// 24小时成交额（计价货币）
    pub volume_24h: f64,
    pub ts_ms: i64,
}

/// 大盘概览快照
///
/// 进程启动时为空壳，由聚合器逐步填充；字段只会被更新值替换，不会回退清空。
/// fear_greed_value / defi_market_cap 为富化字段，上游富化源响应后才有值。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketOverviewSnapshot {
    pub btc_price: f64,
    pub gainers_count: u32,
    pub losers_count: u32,
    pub total_volume_24h: f64,
    #[serde(default)]
    pub fear_greed_value: Option<f64>,
    #[serde(default)]
    pub defi_market_cap: Option<f64>,
    pub updated_at_ms: i64,
}

impl MarketOverviewSnapshot {
    /// 部分周期保护：本次计算缺失的字段沿用上一次的值
    ///
    /// 规则：数值字段本次为零且上次非零则保留上次；富化字段本次为None则保留上次。
    /// 保证部分成功的聚合周期写出的快照非零字段数不少于上一次。
    pub fn carry_forward(mut self, prev: &MarketOverviewSnapshot) -> Self {
        if self.btc_price == 0.0 && prev.btc_price > 0.0 {
            self.btc_price = prev.btc_price;
        }
        if self.total_volume_24h == 0.0 && prev.total_volume_24h > 0.0 {
            self.total_volume_24h = prev.total_volume_24h;
        }
        if self.gainers_count == 0 && self.losers_count == 0
            && (prev.gainers_count > 0 || prev.losers_count > 0)
        {
            self.gainers_count = prev.gainers_count;
            self.losers_count = prev.losers_count;
        }
        if self.fear_greed_value.is_none() {
            self.fear_greed_value = prev.fear_greed_value;
        }
        if self.defi_market_cap.is_none() {
            self.defi_market_cap = prev.defi_market_cap;
        }
        self
    }
}

impl ContentQuality for MarketOverviewSnapshot {
    fn is_placeholder(&self) -> bool {
        // 全部核心数值同时为零才算占位：单个字段合法为零不触发
        self.btc_price == 0.0
            && self.total_volume_24h == 0.0
            && self.gainers_count == 0
            && self.losers_count == 0
    }
}

/// 涨跌幅榜条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoverEntry {
    pub inst_id: String,
    pub last_price: f64,
    pub change_pct_24h: f64,
    pub volume_24h: f64,
}

/// 涨跌幅榜快照
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MoversSnapshot {
    pub gainers: Vec<MoverEntry>,
    pub losers: Vec<MoverEntry>,
    pub updated_at_ms: i64,
}

impl MoversSnapshot {
    /// 截断到调用方要求的条数
    pub fn truncate(mut self, limit: usize) -> Self {
        self.gainers.truncate(limit);
        self.losers.truncate(limit);
        self
    }
}

impl ContentQuality for MoversSnapshot {
    fn is_placeholder(&self) -> bool {
        self.gainers.is_empty() && self.losers.is_empty()
    }
}

/// 信号方向
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalDirection {
    Long,
    Short,
}

/// 多symbol信号记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalRecord {
    pub inst_id: String,
    pub direction: SignalDirection,
    /// 信号强度 0..=100
    pub strength: f64,
    pub change_pct_24h: f64,
    pub volume_24h: f64,
    pub detected_at_ms: i64,
}

/// 信号汇总快照
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalsSnapshot {
    pub signals: Vec<SignalRecord>,
    pub updated_at_ms: i64,
}

impl SignalsSnapshot {
    pub fn truncate(mut self, limit: usize) -> Self {
        self.signals.truncate(limit);
        self
    }
}

impl ContentQuality for SignalsSnapshot {
    fn is_placeholder(&self) -> bool {
        self.signals.is_empty()
    }
}

/// 共振评分组成项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfluenceComponent {
    pub name: String,
    pub score: f64,
    pub weight: f64,
}

/// 单symbol共振分解
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfluenceBreakdown {
    pub inst_id: String,
    pub price_score: f64,
    pub volume_score: f64,
    pub momentum_score: f64,
    pub total_score: f64,
    pub components: Vec<ConfluenceComponent>,
    pub updated_at_ms: i64,
}

impl ContentQuality for ConfluenceBreakdown {
    fn is_placeholder(&self) -> bool {
        self.total_score == 0.0 && self.components.is_empty()
    }
}

/// 响应数据来源标记
///
/// Degraded是显式降级标记：缓存与上游都拿不到可用值时返回，
/// 调用方据此区分"真实数据"与"兜底数据"，绝不把占位值伪装成正常结果。
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum DataSource {
    /// 缓存命中
    CacheTier { tier: TierKind, age_seconds: u64 },
    /// 缓存不可用，实时拉取
    LiveFetch,
    /// 降级：最后已知值或空快照
    Degraded,
}

/// 读取路径返回的带来源标记的数据
#[derive(Debug, Clone, Serialize)]
pub struct MarketData<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> MarketData<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, DataSource::Degraded)
    }
}
