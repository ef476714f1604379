// src/handlers/assets.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::CurrentUser,
        rbac::{AssetsTab, AssignmentsTab, RequireFeature},
    },
    models::asset::{CheckoutPayload, UpsertAssetPayload},
};

// ---
// Registro de hardware
// ---

// GET /api/assets
pub async fn list_assets(
    State(app_state): State<AppState>,
    _guard: RequireFeature<AssetsTab>,
) -> Result<impl IntoResponse, AppError> {
    let assets = app_state.read(|store| store.assets().list().to_vec()).await;
    Ok((StatusCode::OK, Json(assets)))
}

// POST /api/assets
pub async fn save_asset(
    State(app_state): State<AppState>,
    _guard: RequireFeature<AssetsTab>,
    Json(payload): Json<UpsertAssetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let asset = app_state
        .mutate(|store| app_state.assignment_service.save_asset(store, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

// DELETE /api/assets/{id}
pub async fn delete_asset(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<AssetsTab>,
    Path(asset_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.assignment_service.remove_asset(store, &asset_id, &user))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Atribuições
// ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQuery {
    pub employee_id: Option<String>,
}

// GET /api/assignments?employeeId=E002
pub async fn list_assignments(
    State(app_state): State<AppState>,
    _guard: RequireFeature<AssignmentsTab>,
    Query(query): Query<AssignmentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let assignments = app_state
        .read(|store| match query.employee_id.as_deref() {
            Some(employee_id) => app_state
                .assignment_service
                .assignments_for_employee(store, employee_id),
            None => store.assignments().list().to_vec(),
        })
        .await;
    Ok((StatusCode::OK, Json(assignments)))
}

// POST /api/assignments/checkout
pub async fn checkout(
    State(app_state): State<AppState>,
    _guard: RequireFeature<AssignmentsTab>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let assignment = app_state
        .mutate(|store| {
            app_state
                .assignment_service
                .checkout(store, &payload.asset_id, &payload.employee_id)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

// POST /api/assignments/{id}/checkin
pub async fn checkin(
    State(app_state): State<AppState>,
    _guard: RequireFeature<AssignmentsTab>,
    Path(assignment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let assignment = app_state
        .mutate(|store| app_state.assignment_service.checkin(store, &assignment_id))
        .await?;
    Ok((StatusCode::OK, Json(assignment)))
}

// DELETE /api/assignments/{id}
pub async fn delete_assignment(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<AssignmentsTab>,
    Path(assignment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| {
            app_state
                .assignment_service
                .remove_assignment(store, &assignment_id, &user)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
