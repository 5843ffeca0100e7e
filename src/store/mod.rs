// 持久化存储接口
// 核心逻辑只通过这里的 trait 访问用户和博客数据

use async_trait::async_trait;

pub mod models;
pub mod postgres;

pub use models::{Blog, NewBlog, NewUser, User, UserProfile};
pub use postgres::{PgBlogStore, PgUserStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn create(&self, blog: NewBlog) -> Result<Blog, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<Blog>, StoreError>;

    /// 只删除属于 `owner` 的博客，返回是否删除了记录
    async fn delete(&self, id: u64, owner: u64) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<Blog>, StoreError>;
}
