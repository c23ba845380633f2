use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        password::{hash_password, is_long_enough, verify_password, MIN_PASSWORD_LEN},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::repo_types::NewUser,
};

/// Same text for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "incorrect email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        warn!("registration with missing fields");
        return Err(ApiError::validation(
            "username, email and password are required",
        ));
    }

    if !is_long_enough(&payload.password) {
        warn!("password too short");
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // The table's unique constraints are authoritative; these lookups only pick the message.
    if state.users.find_by_email(email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::conflict("email already registered"));
    }
    if state.users.find_by_username(username).await?.is_some() {
        warn!(%username, "username already taken");
        return Err(ApiError::conflict("username already taken"));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "account created".into(),
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let email = payload.email.trim();

    if email.is_empty() || payload.password.is_empty() {
        warn!("login with missing fields");
        return Err(ApiError::validation("email and password are required"));
    }

    let Some(user) = state.users.find_by_email(email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::auth(INVALID_CREDENTIALS));
    };

    match verify_password(&payload.password, &user.password) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(ApiError::auth(INVALID_CREDENTIALS));
        }
        Err(e) => {
            error!(error = %e, user_id = user.id, "stored hash unreadable");
            return Err(ApiError::auth(INVALID_CREDENTIALS));
        }
    }

    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        message: "login successful".into(),
        user: PublicUser::from(user),
    }))
}
