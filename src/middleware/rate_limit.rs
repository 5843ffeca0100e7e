use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    cache::{CredentialCache, keys},
    config::Config,
    error::AppError,
};

/// 按客户端 IP 的固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    cache: CredentialCache,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(cache: CredentialCache, config: &Config) -> Self {
        Self {
            cache,
            max_requests: config.rate_limit_requests,
            window: config.rate_limit_window(),
        }
    }

    /// 依次取 X-Real-IP、X-Forwarded-For 第一项、连接地址
    fn client_ip(req: &Request<Body>) -> String {
        let remote_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());

        req.headers()
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .or_else(|| {
                req.headers()
                    .get("x-forwarded-for")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
            })
            .or(remote_ip.as_deref())
            .unwrap_or("unknown")
            .trim()
            .to_string()
    }

    pub async fn check_rate_limit(
        self: Arc<Self>,
        req: Request<Body>,
        next: Next,
    ) -> Result<Response, AppError> {
        let ip = Self::client_ip(&req);
        let key = keys::rate_limit_key(&ip);

        let count = self
            .cache
            .increment_window(&key, self.window)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Rate limit counter unavailable");
                AppError::internal("rate limiter unavailable")
            })?;

        if count > u64::from(self.max_requests) {
            tracing::debug!(ip = %ip, count, "Rate limit exceeded");
            return Err(AppError::RateLimited(format!(
                "too many requests, retry in {} seconds",
                self.window.as_secs()
            )));
        }

        Ok(next.run(req).await)
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check_rate_limit(req, next).await
}
