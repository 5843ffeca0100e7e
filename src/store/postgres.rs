use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{Blog, BlogStore, NewBlog, NewUser, StoreError, User, UserStore};

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id as u64,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct BlogRow {
    id: i64,
    title: String,
    content: String,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogRow> for Blog {
    fn from(row: BlogRow) -> Self {
        Self {
            id: row.id as u64,
            title: row.title,
            content: row.content,
            user_id: row.user_id as u64,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// BIGSERIAL 主键都是正数，超出 i64 范围的 id 不可能存在
fn to_db_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

fn map_insert_error(e: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(format!("{} already exists", what));
        }
    }
    StoreError::Database(e)
}

/// 用户存储库实现
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let Some(id) = to_db_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "user"))?;

        tracing::info!(user_id = row.id, "Created user");
        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

/// 博客存储库实现
#[derive(Clone)]
pub struct PgBlogStore {
    pool: PgPool,
}

impl PgBlogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn create(&self, blog: NewBlog) -> Result<Blog, StoreError> {
        let Some(user_id) = to_db_id(blog.user_id) else {
            return Err(StoreError::Conflict("owner does not exist".into()));
        };

        let row = sqlx::query_as::<_, BlogRow>(
            r#"
            INSERT INTO blogs (title, content, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, user_id, created_at, updated_at
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.content)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, "blog"))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Blog>, StoreError> {
        let Some(id) = to_db_id(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, BlogRow>(
            r#"
            SELECT id, title, content, user_id, created_at, updated_at
            FROM blogs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Blog::from))
    }

    async fn delete(&self, id: u64, owner: u64) -> Result<bool, StoreError> {
        let (Some(id), Some(owner)) = (to_db_id(id), to_db_id(owner)) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM blogs WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Blog>, StoreError> {
        let rows = sqlx::query_as::<_, BlogRow>(
            r#"
            SELECT id, title, content, user_id, created_at, updated_at
            FROM blogs
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Blog::from).collect())
    }
}
