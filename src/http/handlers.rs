//! HTTP request handlers.
//!
//! Handlers are thin: they decode the request, call into the service layer
//! and translate the outcome into a response. All domain rules live in
//! `crate::services`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use super::dto::{
    GenerateRequest, HealthResponse, ListQuery, PaginatedSchedules, Schedule,
    UpdateScheduleRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::services::{generator, schedules};

/// Type alias for handler results
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// ==================== Health ====================

/// GET /health
///
/// Reports service liveness and the storage backend state.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        repository,
    }))
}

// ==================== Generation ====================

/// POST /api/schedules
///
/// Turns a free-text day description into stored schedules via the
/// text-generation provider. Replies 201 with the created drafts.
pub async fn generate_schedules(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<Vec<Schedule>>), AppError> {
    let created = generator::generate_schedules(
        state.repository.as_ref(),
        state.generator.as_ref(),
        &request.description,
        state.display_offset,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// ==================== Listing ====================

/// GET /api/schedules
///
/// Filtered, sorted, paginated listing of all schedules.
pub async fn list_schedules(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> HandlerResult<PaginatedSchedules> {
    let (pagination, filter) = query.into_parts().map_err(AppError::BadRequest)?;
    let page = schedules::list_schedules(state.repository.as_ref(), pagination, &filter).await?;
    Ok(Json(page.into()))
}

/// GET /api/schedules/today
///
/// Listing constrained to the current local day.
pub async fn today_schedules(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> HandlerResult<PaginatedSchedules> {
    let (pagination, filter) = query.into_parts().map_err(AppError::BadRequest)?;
    let page = schedules::today_schedules(
        state.repository.as_ref(),
        Utc::now(),
        state.display_offset,
        pagination,
        filter,
    )
    .await?;
    Ok(Json(page.into()))
}

/// GET /api/schedules/this-week
///
/// Listing constrained to the current local Monday-to-Monday week.
pub async fn this_week_schedules(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> HandlerResult<PaginatedSchedules> {
    let (pagination, filter) = query.into_parts().map_err(AppError::BadRequest)?;
    let page = schedules::this_week_schedules(
        state.repository.as_ref(),
        Utc::now(),
        state.display_offset,
        pagination,
        filter,
    )
    .await?;
    Ok(Json(page.into()))
}

// ==================== Single schedule ====================

/// GET /api/schedules/{id}
///
/// Fetch one schedule by id.
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Schedule> {
    let schedule = schedules::get_schedule(state.repository.as_ref(), &id).await?;
    Ok(Json(schedule))
}

/// PUT /api/schedules/{id}
///
/// Partial update; absent body fields keep their stored values. Replies
/// with the merged schedule.
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateScheduleRequest>,
) -> HandlerResult<Schedule> {
    let patch = request.into_patch();
    let updated = schedules::update_schedule(state.repository.as_ref(), &id, &patch).await?;
    Ok(Json(updated))
}

/// DELETE /api/schedules/{id}
///
/// Remove one schedule. Replies 204 on success.
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    schedules::delete_schedule(state.repository.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/schedules
///
/// Remove every schedule. Replies 204 regardless of how many existed.
pub async fn delete_all_schedules(
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    schedules::delete_all_schedules(state.repository.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Completion toggles ====================

/// PUT /api/schedules/{id}/done
///
/// Mark a schedule as completed.
pub async fn mark_done(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Schedule> {
    let updated = schedules::set_done(state.repository.as_ref(), &id, true).await?;
    Ok(Json(updated))
}

/// PUT /api/schedules/{id}/undone
///
/// Mark a schedule as not completed.
pub async fn mark_undone(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Schedule> {
    let updated = schedules::set_done(state.repository.as_ref(), &id, false).await?;
    Ok(Json(updated))
}
