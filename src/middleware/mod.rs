mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{AuthUser, auth_middleware, extract_bearer_token};
pub use error_handler::{handle_panic, log_errors};
pub use rate_limit::{RateLimiter, rate_limit};
