use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub const DEFAULT_ROLE: &str = "user";

/// User record in the database. Never leaves the server; see `SafeUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String, // Argon2 hash
    pub role: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// User without credentials, safe to hand to clients and embed in tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SafeUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for SafeUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}
