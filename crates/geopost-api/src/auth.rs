use std::sync::{Arc, LazyLock};

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
};
use regex::Regex;
use tracing::{error, info, warn};

use geopost_types::api::{LoginRequest, SignupRequest};
use geopost_types::models::User;

use crate::error::ApiError;
use crate::posts::PostWriter;
use crate::search::GeoSearch;
use crate::token::TokenAuthority;
use crate::users::UserStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: UserStore,
    pub posts: PostWriter,
    pub search: GeoSearch,
    pub tokens: TokenAuthority,
}

/// Lowercase because the index matches usernames byte for byte.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("username pattern compiles"));

pub fn valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

fn decode_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v).map_err(|e| {
        warn!("Cannot decode user data from client: {}", e);
        ApiError::bad_request("Cannot decode user data from client")
    })
}

/// POST /signup
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received one signup request");
    let req = decode_body(body)?;

    if req.password.is_empty() || !valid_username(&req.username) {
        warn!("Invalid username or password");
        return Err(ApiError::bad_request("Invalid username or password"));
    }

    state
        .users
        .create(User {
            username: req.username,
            password: req.password,
            age: req.age,
            gender: req.gender,
        })
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain")],
        "User added successfully.",
    ))
}

/// POST /login, responds with the raw token.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received one login request");
    let req = decode_body(body)?;

    state.users.verify(&req.username, &req.password).await?;

    let token = state.tokens.issue(&req.username).map_err(|e| {
        error!("Failed to generate token: {}", e);
        ApiError::Internal("Failed to generate token")
    })?;

    Ok(([(header::CONTENT_TYPE, "text/plain")], token))
}
