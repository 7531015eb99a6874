use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    errors::StoreError,
    repo_types::{NewUser, SafeUser, User},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user and return its safe projection.
    ///
    /// Fails with `ConstraintViolation` when the email is already taken at the
    /// storage layer.
    async fn insert(&self, user: NewUser) -> Result<SafeUser, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<SafeUser, StoreError> {
        sqlx::query_as::<_, SafeUser>(
            r#"
            INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StoreError::ConstraintViolation(
                        db_err.constraint().unwrap_or("users_email_key").to_string(),
                    );
                }
            }
            StoreError::Database(e)
        })
    }
}
