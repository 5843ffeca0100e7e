use std::sync::Arc;

use auth::{PasswordHasher, SessionRegistry, TokenCodec};
use cache::{CacheStore, CredentialCache};
use config::Config;
use store::{BlogStore, UserStore};

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod result;
pub mod routes;
pub mod store;

/// 应用状态，启动时构建一次并注入到所有 handler 和中间件
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenCodec>,
    pub cache: CredentialCache,
    pub sessions: SessionRegistry,
    pub users: Arc<dyn UserStore>,
    pub blogs: Arc<dyn BlogStore>,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        blogs: Arc<dyn BlogStore>,
        cache_store: Arc<dyn CacheStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let tokens = Arc::new(TokenCodec::from_config(&config));
        let cache = CredentialCache::new(cache_store);
        let sessions = SessionRegistry::new(
            users.clone(),
            hasher.clone(),
            tokens.clone(),
            cache.clone(),
        );

        Self {
            config: Arc::new(config),
            tokens,
            cache,
            sessions,
            users,
            blogs,
            hasher,
        }
    }
}
