use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{
    cookies,
    dto::{AuthResponse, MeResponse, MessageResponse, SignInInput, SignUpInput},
    errors::AuthError,
    jwt::AuthUser,
    services::{authenticate_user, create_user},
    validation::{FieldError, Schema, SIGN_IN, SIGN_UP},
};
use crate::{error::AppError, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn validate<T: serde::de::DeserializeOwned>(
    schema: &Schema,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(body) = body.map_err(|rejection| {
        AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
    })?;
    schema.parse(&body).map_err(|details| {
        warn!(?details, "validation failed");
        AppError::Validation(details)
    })
}

#[instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let input: SignUpInput = validate(&SIGN_UP, body)?;

    let user = create_user(state.users.as_ref(), input).await?;
    let token = state.jwt.sign(&user).map_err(AuthError::from)?;
    let jar = cookies::set_token(jar, &state.config.cookie, token);

    info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User registered",
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let input: SignInInput = validate(&SIGN_IN, body)?;

    let user = authenticate_user(state.users.as_ref(), input).await?;
    let token = state.jwt.sign(&user).map_err(AuthError::from)?;
    let jar = cookies::set_token(jar, &state.config.cookie, token);

    info!(user_id = user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            message: "User logged in",
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = cookies::clear_token(jar, &state.config.cookie);
    info!("user signed out");
    (
        jar,
        Json(MessageResponse {
            message: "User signed out",
        }),
    )
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(claims): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user: claims.into(),
    })
}
