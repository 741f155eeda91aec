use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// 关闭回调函数
pub type ShutdownHook =
    Box<dyn Fn() -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// 关闭配置
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// 总超时时间
    pub total_timeout: Duration,
    /// 每个钩子的超时时间
    pub hook_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(30),
            hook_timeout: Duration::from_secs(10),
        }
    }
}

/// 优雅停止管理器
///
/// 各后台组件注册关闭钩子，收到信号后按注册顺序执行，
/// 单个钩子超时不阻塞整体关闭。
pub struct ShutdownManager {
    is_shutting_down: Arc<AtomicBool>,
    shutdown_hooks: Arc<RwLock<Vec<(String, ShutdownHook)>>>,
    config: ShutdownConfig,
}

impl ShutdownManager {
    pub fn new(config: ShutdownConfig) -> Self {
        Self {
            is_shutting_down: Arc::new(AtomicBool::new(false)),
            shutdown_hooks: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }

    pub fn new_default() -> Self {
        Self::new(ShutdownConfig::default())
    }

    /// 检查是否正在关闭
    pub fn is_shutting_down(&self) -> bool {
        self.is_shutting_down.load(Ordering::Acquire)
    }

    /// 注册关闭回调
    pub async fn register_shutdown_hook<F, Fut>(&self, name: String, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed_hook: ShutdownHook = Box::new(move || Box::pin(hook()));

        let mut hooks = self.shutdown_hooks.write().await;
        info!("注册关闭回调: {}", name);
        hooks.push((name, boxed_hook));
    }

    /// 执行优雅关闭
    pub async fn shutdown(&self) -> Result<()> {
        if self
            .is_shutting_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("关闭已在进行中");
            return Ok(());
        }

        info!("开始执行优雅关闭，总超时: {:?}", self.config.total_timeout);

        let hooks = self.shutdown_hooks.read().await;
        let deadline = tokio::time::Instant::now() + self.config.total_timeout;

        for (name, hook) in hooks.iter() {
            if tokio::time::Instant::now() >= deadline {
                error!("优雅关闭总超时，剩余钩子跳过");
                return Err(anyhow::anyhow!("graceful shutdown timed out"));
            }
            match tokio::time::timeout(self.config.hook_timeout, hook()).await {
                Ok(Ok(())) => info!("关闭回调完成: {}", name),
                Ok(Err(e)) => error!("关闭回调失败: {} - {}", name, e),
                Err(_) => error!("关闭回调超时: {}", name),
            }
        }

        info!("优雅关闭完成");
        Ok(())
    }
}
