use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};

use super::jwt::TOKEN_TTL;
use crate::config::CookieConfig;

pub const TOKEN_COOKIE: &str = "token";

/// Same attribute set for setting and clearing, so browsers match them up.
fn token_cookie(config: &CookieConfig, value: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Strict)
        .build()
}

pub fn set_token(jar: CookieJar, config: &CookieConfig, token: String) -> CookieJar {
    let mut cookie = token_cookie(config, token);
    cookie.set_max_age(TOKEN_TTL);
    jar.add(cookie)
}

/// Emits a removal cookie even when the request did not carry one.
pub fn clear_token(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    let mut cookie = token_cookie(config, String::new());
    cookie.make_removal();
    jar.add(cookie)
}
