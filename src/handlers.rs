use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    AppState,
    directory::DirectoryMatch,
    error::ApiError,
    models::Schedule,
    scraper::ScheduleTarget,
};

#[derive(Debug, serde::Deserialize)]
pub struct WeekQuery {
    pub week: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[utoipa::path(get, path = "/", tag = "schedule")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "SSAU Timetable API",
        "endpoints": {
            "/api/schedule/group/{groupId}": "Weekly schedule for a student group",
            "/api/schedule/teacher/{staffId}": "Weekly schedule for a staff member",
            "/api/search": "Find groups and teachers by name"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "schedule")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "schedule")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/api/schedule/group/{group_id}",
    params(
        ("group_id" = String, Path, description = "Numeric group id, passed through to the upstream"),
        ("week" = Option<String>, Query, description = "Week number; omitted or empty means the current week")
    ),
    responses(
        (status = 200, description = "Extracted schedule grid", body = Schedule),
        (status = 500, description = "Upstream fetch failed")
    ),
    tag = "schedule"
)]
pub async fn get_group_schedule(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule = state
        .scraper
        .fetch_schedule(ScheduleTarget::Group, &group_id, query.week.as_deref())
        .await
        .map_err(|err| ApiError::upstream("Failed to fetch group schedule", err))?;
    Ok(Json(schedule))
}

#[utoipa::path(
    get,
    path = "/api/schedule/teacher/{staff_id}",
    params(
        ("staff_id" = String, Path, description = "Numeric staff id, passed through to the upstream"),
        ("week" = Option<String>, Query, description = "Week number; omitted or empty means the current week")
    ),
    responses(
        (status = 200, description = "Extracted schedule grid", body = Schedule),
        (status = 500, description = "Upstream fetch failed")
    ),
    tag = "schedule"
)]
pub async fn get_teacher_schedule(
    State(state): State<AppState>,
    Path(staff_id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let schedule = state
        .scraper
        .fetch_schedule(ScheduleTarget::Staff, &staff_id, query.week.as_deref())
        .await
        .map_err(|err| ApiError::upstream("Failed to fetch teacher schedule", err))?;
    Ok(Json(schedule))
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("query" = String, Query, description = "Substring of a group name or teacher name")
    ),
    responses(
        (status = 200, description = "Matching groups and teachers", body = [DirectoryMatch])
    ),
    tag = "schedule"
)]
pub async fn search_directory(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    Json(state.directory.search(&query.query))
}
