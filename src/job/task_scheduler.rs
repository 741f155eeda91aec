use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 等待单个任务退出的上限
const JOIN_TIMEOUT_SECS: u64 = 5;

/// 周期任务调度器
///
/// 每个任务一个独立的interval循环；每轮tick在单独的task里执行，
/// 单轮的失败或panic被隔离，不会终止调度循环本身。
pub struct TaskScheduler {
    handles: Vec<(String, JoinHandle<()>)>,
    shutdown_tx: watch::Sender<bool>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            handles: Vec::new(),
            shutdown_tx,
        }
    }

    /// 注册周期任务
    ///
    /// factory每轮调用一次产出future。首轮tick立即触发。
    pub fn add_periodic_task<F, Fut>(&mut self, name: String, interval_ms: u64, factory: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!("周期任务启动: {} interval={}ms", task_name, interval_ms);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // 单轮隔离：panic只终止本轮
                        if let Err(e) = tokio::spawn(factory()).await {
                            error!("周期任务单轮异常: {}: {}", task_name, e);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("周期任务退出: {}", task_name);
                            break;
                        }
                    }
                }
            }
        });

        self.handles.push((name, handle));
    }

    /// 通知所有任务退出并等待结束
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for (name, handle) in self.handles.drain(..) {
            if tokio::time::timeout(Duration::from_secs(JOIN_TIMEOUT_SECS), handle)
                .await
                .is_err()
            {
                warn!("等待任务退出超时: {}", name);
            }
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}
