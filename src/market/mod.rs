//! # 市场数据
//!
//! 快照类型、缓存key规划、上游行情适配、聚合计算与读取路径。

pub mod aggregator;
pub mod compute;
pub mod coordinator;
pub mod enrichment;
pub mod keys;
pub mod types;
pub mod upstream;

pub use aggregator::MarketAggregator;
pub use coordinator::MarketDataService;
pub use types::{
    ConfluenceBreakdown, DataSource, MarketData, MarketOverviewSnapshot, MoverEntry,
    MoversSnapshot, SignalDirection, SignalRecord, SignalsSnapshot, TickerRecord,
};
pub use upstream::{OkxUpstreamSource, UpstreamError, UpstreamSource};
