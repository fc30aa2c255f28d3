// src/handlers/demands.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, rbac::RequireSupervisor},
    models::demands::{AssignDemandPayload, DemandFilters, DemandPayload, UpdateStatusPayload},
};

// =============================================================================
//  LISTAGENS
// =============================================================================

// GET /api/demands
pub async fn list_demands(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<DemandFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .demand_service
        .list_active(&user, filters)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(page)))
}

// GET /api/demands/completed
pub async fn list_completed_demands(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<DemandFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .demand_service
        .list_completed(&user, filters)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(page)))
}

// =============================================================================
//  CRUD
// =============================================================================

// POST /api/demands
pub async fn create_demand(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<DemandPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let demand = app_state
        .demand_service
        .create(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(demand)))
}

// GET /api/demands/{id}
pub async fn get_demand(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .demand_service
        .detail(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/demands/{id}
pub async fn update_demand(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<DemandPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let demand = app_state
        .demand_service
        .update(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(demand)))
}

// DELETE /api/demands/{id}
pub async fn delete_demand(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .demand_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  FLUXO
// =============================================================================

// POST /api/demands/{id}/status
pub async fn update_demand_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let demand = app_state
        .demand_service
        .change_status(&user, id, payload.status, payload.note.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(demand)))
}

// POST /api/demands/{id}/assign
pub async fn assign_demand(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<AssignDemandPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let demand = app_state
        .demand_service
        .assign(&user, id, payload.user_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(demand)))
}

// DELETE /api/demand-logs/{id}
pub async fn delete_demand_log(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireSupervisor,
    Path(log_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let demand_id = app_state
        .demand_service
        .delete_log(log_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(json!({ "demandId": demand_id }))))
}
