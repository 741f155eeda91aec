use std::sync::Arc;

use tracing::{error, info};

use crate::app_config::env::env_u64;
use crate::job::task_scheduler::TaskScheduler;
use crate::market::aggregator::MarketAggregator;

/// 聚合周期间隔（毫秒），MARKET_AGGREGATE_INTERVAL_MS 可覆盖
pub fn default_interval_ms() -> u64 {
    env_u64("MARKET_AGGREGATE_INTERVAL_MS", 30_000)
}

/// 注册聚合任务到调度器
///
/// 每轮自带错误边界：单轮失败记日志后循环继续。
pub fn register(scheduler: &mut TaskScheduler, aggregator: Arc<MarketAggregator>, interval_ms: u64) {
    scheduler.add_periodic_task("market_aggregate_job".to_string(), interval_ms, move || {
        let aggregator = Arc::clone(&aggregator);
        async move {
            match aggregator.run_cycle().await {
                Ok(report) => {
                    info!(
                        "aggregate cycle ok: tickers={} written={} skipped={}",
                        report.tickers_seen, report.keys_written, report.keys_skipped
                    );
                }
                Err(e) => error!("聚合周期失败: {}", e),
            }
        }
    });
}
