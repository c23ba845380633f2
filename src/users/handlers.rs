use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::{
            ChartData, MessageResponse, ProfileResponse, StatsResponse, UpdateProfileRequest,
            UserListItem,
        },
        repo::SortOrder,
        services,
    },
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/profile/:id",
        get(get_profile).put(update_profile).delete(delete_profile),
    )
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/users/export", get(export_users))
        .route("/users/chart-data", get(chart_data))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Path(id) = id?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() || email.is_empty() {
        warn!(user_id = id, "profile update with missing fields");
        return Err(ApiError::validation("username and email are required"));
    }

    // No existence check: an unknown id updates nothing and still succeeds.
    let rows = state.users.update_profile(id, username, email).await?;
    info!(user_id = id, rows, "profile updated");
    Ok(Json(MessageResponse::new("profile updated")))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    let rows = state.users.delete(id).await?;
    info!(user_id = id, rows, "user deleted");
    Ok(Json(MessageResponse::new("account deleted")))
}

#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = services::dashboard_stats(state.users.as_ref(), OffsetDateTime::now_utc()).await?;
    Ok(Json(stats))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserListItem>>> {
    let items = services::list_users(state.users.as_ref(), SortOrder::NewestFirst).await?;
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn export_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items = services::list_users(state.users.as_ref(), SortOrder::OldestFirst).await?;
    let body = services::render_csv(&items);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=users.csv",
            ),
        ],
        body,
    ))
}

#[instrument(skip(state))]
pub async fn chart_data(State(state): State<AppState>) -> ApiResult<Json<ChartData>> {
    let registrations =
        services::registration_chart(state.users.as_ref(), OffsetDateTime::now_utc()).await?;
    Ok(Json(ChartData { registrations }))
}
