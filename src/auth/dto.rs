use serde::{Deserialize, Serialize};

use super::{jwt::Claims, repo_types::SafeUser};

/// Validated sign-up body.
#[derive(Debug, Deserialize)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Validated sign-in body.
#[derive(Debug, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<SafeUser> for PublicUser {
    fn from(u: SafeUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        }
    }
}

impl From<Claims> for PublicUser {
    fn from(c: Claims) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            role: c.role,
        }
    }
}

/// Response returned after sign-up or sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}
