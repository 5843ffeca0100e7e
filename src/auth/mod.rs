// 认证模块
// 令牌签发与校验、密码哈希、登录登出编排

pub mod password;
pub mod session;
pub mod token;

pub use password::{BcryptHasher, PasswordHasher};
pub use session::{PROFILE_CACHE_TTL, REVOCATION_FLOOR, SessionError, SessionRegistry, revocation_ttl};
pub use token::{Claims, TokenCodec, TokenError};
