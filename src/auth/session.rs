use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::password::PasswordHasher;
use super::token::{TokenCodec, TokenError};
use crate::cache::{CacheError, CleanupError, CredentialCache, keys};
use crate::store::{StoreError, UserProfile, UserStore};

/// 撤销条目的最短存活时间，令牌已过期时使用
pub const REVOCATION_FLOOR: Duration = Duration::from_secs(5 * 60);

/// 用户资料缓存时间，与令牌过期时间无关
pub const PROFILE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,
    #[error("failed to generate token: {0}")]
    TokenGeneration(#[source] TokenError),
    #[error("failed to blacklist token: {0}")]
    TokenBlacklist(#[source] CacheError),
    /// 令牌已撤销，但缓存中可能残留旧数据直到其自然过期
    #[error("failed to clean user session: {0}")]
    SessionCleanup(#[source] CleanupError),
    /// 资料已从数据库读出，但写入缓存失败，下次读取仍会回源
    #[error("cache operation failed: {source}")]
    CacheOperation {
        profile: Box<UserProfile>,
        #[source]
        source: CacheError,
    },
    #[error("database error: {0}")]
    Store(#[from] StoreError),
}

/// 撤销条目的 TTL：令牌剩余有效期，已过期时退回到固定下限
pub fn revocation_ttl(expires_at: i64, now: i64) -> Duration {
    let remaining = expires_at - now;
    if remaining <= 0 {
        REVOCATION_FLOOR
    } else {
        Duration::from_secs(remaining as u64)
    }
}

/// 登录、登出和资料读取的编排
#[derive(Clone)]
pub struct SessionRegistry {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenCodec>,
    cache: CredentialCache,
}

impl SessionRegistry {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenCodec>,
        cache: CredentialCache,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            cache,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, SessionError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(SessionError::InvalidPassword);
        }

        let token = self
            .tokens
            .issue(user.id, &user.username)
            .map_err(SessionError::TokenGeneration)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    /// 先写撤销条目，再清理用户命名空间下的缓存；任一步失败立即返回
    pub async fn logout(
        &self,
        user_id: u64,
        token: &str,
        expires_at: i64,
    ) -> Result<(), SessionError> {
        let ttl = revocation_ttl(expires_at, Utc::now().timestamp());

        self.cache
            .revoke_token(token, ttl)
            .await
            .map_err(SessionError::TokenBlacklist)?;

        let removed = self
            .cache
            .scan_and_delete_prefix(&keys::user_namespace(user_id))
            .await
            .map_err(|e| {
                tracing::warn!(user_id, error = %e, "Token revoked but session cleanup failed");
                SessionError::SessionCleanup(e)
            })?;

        tracing::info!(user_id, removed, revoked_for = ttl.as_secs(), "User logged out");
        Ok(())
    }

    /// 返回资料和是否来自缓存
    pub async fn get_profile(&self, user_id: u64) -> Result<(UserProfile, bool), SessionError> {
        let key = keys::user_profile_key(user_id);

        match self.cache.get_json::<UserProfile>(&key).await {
            Ok(Some(profile)) => return Ok((profile, true)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Profile cache read failed, falling back to database");
            }
        }

        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(SessionError::UserNotFound),
            Err(e) => {
                tracing::error!(user_id, error = %e, "Failed to load user profile");
                return Err(SessionError::UserNotFound);
            }
        };

        let profile = UserProfile::from(user);
        if let Err(source) = self.cache.set_json(&key, &profile, PROFILE_CACHE_TTL).await {
            return Err(SessionError::CacheOperation {
                profile: Box::new(profile),
                source,
            });
        }

        Ok((profile, false))
    }
}
