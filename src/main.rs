use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};

use market_pulse::app_config::log::setup_logging;
use market_pulse::app_config::redis::init_redis_pool;
use market_pulse::app_config::shutdown_manager::ShutdownManager;
use market_pulse::cache::TierStore;
use market_pulse::job::{market_aggregator_job, TaskScheduler};
use market_pulse::market::{MarketAggregator, OkxUpstreamSource};

#[derive(Parser, Debug)]
#[command(name = "market_pulse", about = "市场行情缓存聚合服务")]
struct Cli {
    /// 只执行一个聚合周期后退出（手动预热/排查用）
    #[arg(long)]
    once: bool,

    /// 聚合周期间隔毫秒，覆盖 MARKET_AGGREGATE_INTERVAL_MS
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // 设置日志
    setup_logging()?;

    // Redis不可达时tier 2自行降级为miss，进程继续以tier 1/3运行
    if let Err(e) = init_redis_pool().await {
        warn!("Redis初始化失败，共享缓存层降级: {}", e);
    }

    let store = Arc::new(TierStore::with_default_tiers());
    let upstream = Arc::new(OkxUpstreamSource::from_env().map_err(|e| {
        error!("上游行情源初始化失败: {}", e);
        anyhow::anyhow!(e.to_string())
    })?);
    let aggregator = Arc::new(MarketAggregator::new(
        Arc::clone(&store),
        upstream.clone() as Arc<dyn market_pulse::market::UpstreamSource>,
    ));

    // 单周期模式
    if cli.once {
        let report = aggregator
            .run_cycle()
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        info!(
            "单周期完成: tickers={} written={} skipped={}",
            report.tickers_seen, report.keys_written, report.keys_skipped
        );
        return Ok(());
    }

    let interval_ms = cli
        .interval_ms
        .unwrap_or_else(market_aggregator_job::default_interval_ms);

    let scheduler = Arc::new(tokio::sync::Mutex::new(TaskScheduler::new()));
    {
        let mut guard = scheduler.lock().await;
        market_aggregator_job::register(&mut guard, Arc::clone(&aggregator), interval_ms);
    }

    let shutdown_manager = ShutdownManager::new_default();
    {
        let scheduler = Arc::clone(&scheduler);
        shutdown_manager
            .register_shutdown_hook("task_scheduler".to_string(), move || {
                let scheduler = Arc::clone(&scheduler);
                async move {
                    scheduler.lock().await.shutdown().await;
                    Ok(())
                }
            })
            .await;
    }

    // 捕捉Ctrl+C信号以平滑关闭
    tokio::signal::ctrl_c().await?;
    info!("收到退出信号，开始关闭");
    shutdown_manager.shutdown().await?;

    Ok(())
}
