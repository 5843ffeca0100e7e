use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{AppState, auth::Claims, auth::TokenError, config::RevocationFailMode, error::AppError};

/// 认证通过后挂到请求上的身份信息，由下游 handler 通过提取器读取
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
    /// 原始令牌字符串，登出时用于写入撤销列表
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("unauthorized"))
    }
}

/// 去掉 `Bearer ` 前缀，没有前缀时整段视为令牌
pub fn extract_bearer_token(header: &str) -> Result<&str, AppError> {
    // 经过 HTTP 解析后 "Bearer " 末尾的空格会被去掉
    let header = header.trim();
    let token = match header.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim_start(),
        _ => header,
    };
    if token.is_empty() {
        return Err(AppError::unauthorized("missing authorization token"));
    }
    Ok(token)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid authorization header"))?;
    let token = extract_bearer_token(header)?.to_string();

    let claims = state.tokens.decode(&token).map_err(|e| {
        match &e {
            TokenError::InvalidSignature => tracing::debug!("Rejected token: signature invalid"),
            other => tracing::debug!("Rejected token: {}", other),
        }
        AppError::unauthorized("invalid or expired token")
    })?;

    match state.cache.is_token_revoked(&token).await {
        Ok(true) => {
            tracing::debug!(user_id = claims.user_id, "Rejected blacklisted token");
            return Err(AppError::unauthorized("token is blacklisted"));
        }
        Ok(false) => {}
        Err(e) => match state.config.revocation_fail_mode {
            RevocationFailMode::Closed => {
                tracing::error!(error = %e, "Revocation check failed, rejecting request");
                return Err(AppError::internal("failed to check token revocation"));
            }
            RevocationFailMode::Open => {
                tracing::warn!(
                    user_id = claims.user_id,
                    error = %e,
                    "Revocation check failed, accepting token without it"
                );
            }
        },
    }

    req.extensions_mut().insert(AuthUser { claims, token });
    Ok(next.run(req).await)
}
