use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

/// 撤销检查时缓存不可用的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationFailMode {
    /// 缓存不可用时拒绝请求
    #[default]
    Closed,
    /// 缓存不可用时跳过撤销检查
    Open,
}

impl FromStr for RevocationFailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            other => Err(format!("expected `open` or `closed`, got `{}`", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: i64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub revocation_fail_mode: RevocationFailMode,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源解析配置，便于测试时不触碰进程环境变量
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                reason: "must not be empty".into(),
            });
        }

        // JWT_EXPIRATION 以小时为单位，允许 "24h" 写法
        let jwt_expiration_secs = match lookup("JWT_EXPIRATION") {
            Some(raw) => {
                let hours: i64 = parse_var("JWT_EXPIRATION", raw.trim().trim_end_matches('h'))?;
                expiration_secs(hours)?
            }
            None => 24 * 3600,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: required("REDIS_URL")?,
            jwt_secret,
            jwt_expiration_secs,
            rate_limit_window_secs: optional(&lookup, "RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: optional(&lookup, "RATE_LIMIT_REQUESTS", 100)?,
            revocation_fail_mode: optional(
                &lookup,
                "REVOCATION_FAIL_MODE",
                RevocationFailMode::Closed,
            )?,
            bcrypt_cost: optional(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "::".into()),
            server_port: optional(&lookup, "SERVER_PORT", 3000)?,
            api_base_uri: normalize_base_uri(&lookup("API_BASE_URI").unwrap_or_default())?,
        })
    }

    /// 令牌有效期，超出范围时按最大值处理，签发时会因过期时间溢出而失败
    pub fn jwt_expiration(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.jwt_expiration_secs).unwrap_or(TimeDelta::MAX)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

/// 小时数换算为秒，并保证签发时 `now + lifetime` 不会溢出
fn expiration_secs(hours: i64) -> Result<i64, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        var: "JWT_EXPIRATION",
        reason: reason.into(),
    };

    if hours <= 0 {
        return Err(invalid("must be at least 1 hour"));
    }
    let secs = hours
        .checked_mul(3600)
        .ok_or_else(|| invalid("too large"))?;
    let lifetime = TimeDelta::try_seconds(secs).ok_or_else(|| invalid("too large"))?;
    Utc::now()
        .checked_add_signed(lifetime)
        .ok_or_else(|| invalid("too large"))?;
    Ok(secs)
}

/// 空值和 "/" 表示不加前缀，其余必须以 "/" 开头，末尾的 "/" 会被去掉
fn normalize_base_uri(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "/" {
        return Ok(String::new());
    }
    if !raw.starts_with('/') {
        return Err(ConfigError::Invalid {
            var: "API_BASE_URI",
            reason: format!("`{}` must start with `/`", raw),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn optional<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse_var(var, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/blog"),
        ("REDIS_URL", "redis://127.0.0.1/"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.jwt_expiration(), TimeDelta::hours(24));
        assert_eq!(config.rate_limit_requests, 100);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.revocation_fail_mode, RevocationFailMode::Closed);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.api_base_uri, "");
    }

    #[test]
    fn hour_suffix_and_fail_mode_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("JWT_EXPIRATION", "2h"));
        pairs.push(("REVOCATION_FAIL_MODE", "Open"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.jwt_expiration_secs, 7200);
        assert_eq!(config.revocation_fail_mode, RevocationFailMode::Open);
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RATE_LIMIT_REQUESTS", "lots"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "RATE_LIMIT_REQUESTS",
                ..
            }
        ));
    }

    fn with(var: &'static str, value: &'static str) -> Result<Config, ConfigError> {
        let mut pairs = REQUIRED.to_vec();
        pairs.push((var, value));
        Config::from_lookup(lookup_from(&pairs))
    }

    #[test]
    fn root_base_uri_means_no_prefix() {
        assert_eq!(with("API_BASE_URI", "/").unwrap().api_base_uri, "");
        assert_eq!(with("API_BASE_URI", "").unwrap().api_base_uri, "");
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_uri() {
        assert_eq!(with("API_BASE_URI", "/api/v1/").unwrap().api_base_uri, "/api/v1");
        assert_eq!(with("API_BASE_URI", "/api").unwrap().api_base_uri, "/api");
    }

    #[test]
    fn base_uri_without_leading_slash_is_rejected() {
        let err = with("API_BASE_URI", "api").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "API_BASE_URI", .. }));
    }

    #[test]
    fn out_of_range_expiration_is_rejected() {
        for value in ["6000000000000000h", "3000000000000h", "2562047788015216", "0h", "-5"] {
            let err = with("JWT_EXPIRATION", value).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: "JWT_EXPIRATION", .. }),
                "{} was accepted",
                value
            );
        }
    }

    #[test]
    fn validated_expiration_builds_a_token_codec() {
        let config = with("JWT_EXPIRATION", "8760h").unwrap();
        assert_eq!(config.jwt_expiration(), TimeDelta::hours(8760));

        let codec = crate::auth::TokenCodec::from_config(&config);
        let claims = codec.decode(&codec.issue(1, "alice").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 8760 * 3600);
    }
}
