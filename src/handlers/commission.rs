// src/handlers/commission.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireSupervisor},
    models::commission::{CommissionTaskFilters, CommissionTaskPayload},
};

// GET /api/predefined-services
pub async fn list_predefined_services(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .commission_service
        .catalog()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(services)))
}

// GET /api/commission-tasks
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<CommissionTaskFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .commission_service
        .list(&user, filters)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/commission-tasks/{id}
pub async fn get_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let task = app_state
        .commission_service
        .detail(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(task)))
}

// POST /api/commission-tasks
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CommissionTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let task = app_state
        .commission_service
        .create(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(task)))
}

// PUT /api/commission-tasks/{id}
pub async fn update_task(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    Path(id): Path<i32>,
    Json(payload): Json<CommissionTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let task = app_state
        .commission_service
        .update(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(task)))
}

// DELETE /api/commission-tasks/{id}
pub async fn delete_task(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .commission_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}
