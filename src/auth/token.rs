use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// JWT 载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub username: String,
    pub iat: i64, // 签发时间
    pub exp: i64, // 过期时间
    pub jti: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("failed to sign token: {0}")]
    Generation(String),
}

/// 令牌编解码器，密钥在启动时从配置注入
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.jwt_expiration())
    }

    pub fn issue(&self, user_id: u64, username: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| TokenError::Generation("expiry out of range".into()))?;

        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        // jsonwebtoken 只拒绝 exp < now，这里把 exp == now 也视为过期
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(secret.as_bytes(), Duration::hours(24))
    }

    #[test]
    fn issued_token_decodes_to_same_subject() {
        let codec = codec("test-secret-key");
        let token = codec.issue(42, "alice").unwrap();

        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn tokens_issued_back_to_back_are_distinct() {
        let codec = codec("test-secret-key");
        let first = codec.issue(1, "alice").unwrap();
        let second = codec.issue(1, "alice").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_secret_is_a_signature_error() {
        let token = codec("issuer-secret").issue(7, "bob").unwrap();
        let err = codec("other-secret").decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected_with_right_secret() {
        let expired = TokenCodec::new(b"test-secret-key", Duration::minutes(-2));
        let token = expired.issue(7, "bob").unwrap();

        let err = codec("test-secret-key").decode(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = codec("s").decode("not-a-token").unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn unsigned_token_never_passes() {
        // header {"alg":"none","typ":"JWT"}, payload {"user_id":1}, empty signature
        let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJ1c2VyX2lkIjoxfQ.";
        assert!(codec("s").decode(unsigned).is_err());
    }
}
