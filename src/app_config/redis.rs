use std::env;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tracing::{error, info};

/// Redis连接池管理器
///
/// 持有Client，按需派生多路复用连接。共享缓存层（tier 2）完全走这里，
/// Redis不可用时由缓存层自行降级，不在此处重试。
pub struct RedisConnectionPool {
    client: Client,
}

impl RedisConnectionPool {
    /// 创建新的连接池并做一次连通性测试
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client =
            Client::open(redis_url).map_err(|e| anyhow!("Failed to create Redis client: {}", e))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!("Redis connection test failed: {}", redis_url);
                anyhow!("Failed to test Redis connection: {}", e)
            })?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow!("Redis PING failed: {}", e))?;
        if pong != "PONG" {
            return Err(anyhow!("Unexpected PING reply: {}", pong));
        }

        Ok(Self { client })
    }

    /// 获取多路复用连接
    pub async fn get_connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| anyhow!("Failed to get multiplexed connection: {}", e))?;
        Ok(conn)
    }
}

/// 全局Redis连接池实例
pub static REDIS_POOL: OnceCell<RedisConnectionPool> = OnceCell::new();

/// 初始化Redis连接池，REDIS_HOST 形如 redis://127.0.0.1:6379/
pub async fn init_redis_pool() -> Result<()> {
    let redis_url =
        env::var("REDIS_HOST").unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string());

    let pool = RedisConnectionPool::new(&redis_url).await?;

    REDIS_POOL
        .set(pool)
        .map_err(|_| anyhow!("Redis connection pool already initialized"))?;

    info!("Redis connection pool initialized");
    Ok(())
}

/// 获取Redis连接池实例
pub fn get_redis_pool() -> Result<&'static RedisConnectionPool> {
    REDIS_POOL
        .get()
        .ok_or_else(|| anyhow!("Redis连接池未初始化，请先调用 init_redis_pool()"))
}

/// 获取Redis连接
pub async fn get_redis_connection() -> Result<MultiplexedConnection> {
    let pool = get_redis_pool()?;
    pool.get_connection().await
}
