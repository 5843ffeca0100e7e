#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use backend::{
    AppState,
    auth::{BcryptHasher, PasswordHasher},
    cache::{CacheError, CacheStore, MemoryStore},
    config::{Config, RevocationFailMode},
    routes::create_router_with,
    store::{Blog, BlogStore, NewBlog, NewUser, StoreError, User, UserStore},
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key";
pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        redis_url: "redis://unused".into(),
        jwt_secret: TEST_SECRET.into(),
        jwt_expiration_secs: 24 * 3600,
        rate_limit_window_secs: 60,
        rate_limit_requests: 1000,
        revocation_fail_mode: RevocationFailMode::Closed,
        bcrypt_cost: 4,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: String::new(),
    }
}

/// 内存用户存储，记录调用次数并可模拟故障
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemoryUserStore {
    fn check(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::Conflict("user already exists".into()));
        }

        let now = Utc::now();
        let created = User {
            id: users.len() as u64 + 1,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        Ok(self.users.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryBlogStore {
    blogs: Mutex<Vec<Blog>>,
    next_id: AtomicUsize,
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn create(&self, blog: NewBlog) -> Result<Blog, StoreError> {
        let now = Utc::now();
        let created = Blog {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as u64 + 1,
            title: blog.title,
            content: blog.content,
            user_id: blog.user_id,
            created_at: now,
            updated_at: now,
        };
        self.blogs.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Blog>, StoreError> {
        Ok(self.blogs.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn delete(&self, id: u64, owner: u64) -> Result<bool, StoreError> {
        let mut blogs = self.blogs.lock().unwrap();
        let before = blogs.len();
        blogs.retain(|b| !(b.id == id && b.user_id == owner));
        Ok(blogs.len() < before)
    }

    async fn list(&self) -> Result<Vec<Blog>, StoreError> {
        Ok(self.blogs.lock().unwrap().clone())
    }
}

/// 包装内存缓存，按操作类型注入故障
#[derive(Default)]
pub struct FlakyCache {
    pub inner: MemoryStore,
    pub get_calls: AtomicUsize,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_scan: AtomicBool,
    pub fail_delete: AtomicBool,
}

fn injected(flag: &AtomicBool, op: &str) -> Result<(), CacheError> {
    if flag.load(Ordering::SeqCst) {
        return Err(CacheError::Unavailable(format!("injected {} failure", op)));
    }
    Ok(())
}

#[async_trait]
impl CacheStore for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        injected(&self.fail_get, "get")?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        injected(&self.fail_set, "set")?;
        self.inner.set_ex(key, value, ttl).await
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        injected(&self.fail_scan, "scan")?;
        self.inner.scan_prefix(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        injected(&self.fail_delete, "delete")?;
        self.inner.delete(key).await
    }

    async fn incr_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        self.inner.incr_window(key, window).await
    }
}

pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub blogs: Arc<MemoryBlogStore>,
    pub cache: Arc<FlakyCache>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_routes(config, Router::new())
    }

    /// 额外路由与内置路由一起挂载，经过同一套全局中间件
    pub fn with_routes(config: Config, extra: Router<AppState>) -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let blogs = Arc::new(MemoryBlogStore::default());
        let cache = Arc::new(FlakyCache::default());
        let hasher = BcryptHasher::new(config.bcrypt_cost);

        let state = AppState::new(
            config,
            users.clone(),
            blogs.clone(),
            cache.clone(),
            Arc::new(hasher),
        );
        let router = create_router_with(state.clone(), extra);

        Self {
            state,
            users,
            blogs,
            cache,
            router,
        }
    }

    /// 直接写入存储，不经过 HTTP，也不计入调用次数
    pub async fn seed_user(&self, username: &str, email: &str) -> User {
        let password_hash = self.state.hasher.hash(TEST_PASSWORD).unwrap();
        let user = self
            .users
            .create(NewUser {
                username: username.into(),
                email: email.into(),
                password_hash,
            })
            .await
            .unwrap();
        self.users.calls.store(0, Ordering::SeqCst);
        user
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_from("127.0.0.1", method, uri, auth, body).await
    }

    pub async fn request_from(
        &self,
        ip: &str,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-real-ip", ip);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/users/login",
                None,
                Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["resp_data"]["token"].as_str().unwrap().to_string()
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
