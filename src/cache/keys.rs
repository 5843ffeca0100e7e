/// 撤销令牌缓存键前缀
const REVOKED_TOKEN_PREFIX: &str = "revoked:";

/// 用户命名空间前缀，登出时整体清理
const USER_PREFIX: &str = "user:";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 撤销条目的标记值
pub const REVOKED_SENTINEL: &str = "blacklisted";

pub fn revoked_token_key(token: &str) -> String {
    format!("{}{}", REVOKED_TOKEN_PREFIX, token)
}

/// 以 `:` 结尾，避免用户 1 的前缀匹配到用户 10
pub fn user_namespace(user_id: u64) -> String {
    format!("{}{}:", USER_PREFIX, user_id)
}

pub fn user_profile_key(user_id: u64) -> String {
    format!("{}profile", user_namespace(user_id))
}

pub fn rate_limit_key(client: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client)
}
