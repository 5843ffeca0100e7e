use bcrypt::{BcryptError, hash, verify};

/// 密码哈希接口
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, BcryptError>;

    /// 哈希格式错误时同样视为不匹配
    fn verify(&self, plain: &str, hashed: &str) -> bool;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, BcryptError> {
        hash(plain.as_bytes(), self.cost)
    }

    fn verify(&self, plain: &str, hashed: &str) -> bool {
        match verify(plain.as_bytes(), hashed) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!("Stored password hash could not be verified: {}", e);
                false
            }
        }
    }
}
