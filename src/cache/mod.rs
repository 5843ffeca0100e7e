// 缓存模块
// 一个物理存储，按键前缀划分为撤销列表、用户资料缓存和限流计数

use std::time::Duration;

use async_trait::async_trait;

pub mod keys;
pub mod memory;
pub mod operations;
pub mod redis;

pub use memory::MemoryStore;
pub use operations::{CleanupError, CredentialCache};
pub use self::redis::RedisStore;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 底层键值存储需要提供的操作
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 键不存在时返回 `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 覆盖写入并设置过期时间
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// 列出所有以 `prefix` 开头的键
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// 计数加一，首次创建时设置窗口过期时间，返回当前计数
    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError>;
}
