use thiserror::Error;

/// Failure of the hashing primitive. A password mismatch is not an error.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Token failures. Verification causes (signature, format, expiry) are not
/// distinguished.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),

    #[error("invalid or expired token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcomes of registration and authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("email uniqueness violated on insert: {0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(constraint) => AuthError::ConstraintViolation(constraint),
            StoreError::Database(e) => AuthError::Database(e),
        }
    }
}
