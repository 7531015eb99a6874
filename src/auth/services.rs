use tracing::{error, info, warn};

use super::{
    dto::{SignInInput, SignUpInput},
    errors::{AuthError, PasswordError},
    password,
    repo::UserStore,
    repo_types::{NewUser, SafeUser},
};

async fn hash_password(plain: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
}

async fn verify_password(plain: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
}

/// Register a new user.
///
/// The lookup is only a fast path; the unique constraint on `users.email`
/// decides concurrent registrations and surfaces as `ConstraintViolation`.
pub async fn create_user(users: &dyn UserStore, input: SignUpInput) -> Result<SafeUser, AuthError> {
    if users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash = hash_password(input.password).await?;

    let user = users
        .insert(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
            role: input.role,
        })
        .await
        .map_err(|e| {
            error!(error = %e, "insert user failed");
            AuthError::from(e)
        })?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok(user)
}

/// Check credentials and return the user without its password hash.
pub async fn authenticate_user(
    users: &dyn UserStore,
    input: SignInInput,
) -> Result<SafeUser, AuthError> {
    let Some(user) = users.find_by_email(&input.email).await? else {
        warn!(email = %input.email, "sign-in unknown email");
        return Err(AuthError::UserNotFound);
    };

    if !verify_password(input.password, user.password.clone()).await? {
        warn!(user_id = user.id, "sign-in invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::memory::{MemoryUserStore, RacingUserStore};

    fn sign_up(email: &str, password: &str) -> SignUpInput {
        SignUpInput {
            name: "A".into(),
            email: email.into(),
            password: password.into(),
            role: "user".into(),
        }
    }

    fn sign_in(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn create_then_authenticate() {
        let store = MemoryUserStore::default();
        let created = create_user(&store, sign_up("a@x.com", "secret123"))
            .await
            .expect("create user");
        assert_eq!(created.email, "a@x.com");
        assert_eq!(created.role, "user");

        let user = authenticate_user(&store, sign_in("a@x.com", "secret123"))
            .await
            .expect("authenticate");
        assert_eq!(user, created);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn stored_password_is_hashed() {
        let store = MemoryUserStore::default();
        create_user(&store, sign_up("a@x.com", "secret123")).await.unwrap();
        let row = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(row.password, "secret123");
        assert!(password::verify_password("secret123", &row.password).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::default();
        create_user(&store, sign_up("a@x.com", "secret123")).await.unwrap();
        let err = create_user(&store, sign_up("a@x.com", "other-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn lost_race_surfaces_constraint_violation() {
        let err = create_user(&RacingUserStore, sign_up("a@x.com", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let store = MemoryUserStore::default();
        create_user(&store, sign_up("a@x.com", "secret123")).await.unwrap();
        let err = authenticate_user(&store, sign_in("a@x.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_email_is_user_not_found() {
        let store = MemoryUserStore::default();
        let err = authenticate_user(&store, sign_in("ghost@x.com", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
