// src/handlers/repairs.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::CurrentUser,
        rbac::{RepairsTab, RequireFeature},
    },
    models::repair::{AdvanceRepairPayload, ConsumePartPayload, OpenRepairPayload},
};

// GET /api/repairs
pub async fn list_repairs(
    State(app_state): State<AppState>,
    _guard: RequireFeature<RepairsTab>,
) -> Result<impl IntoResponse, AppError> {
    let repairs = app_state.read(|store| store.repairs().list().to_vec()).await;
    Ok((StatusCode::OK, Json(repairs)))
}

// POST /api/repairs
pub async fn open_repair(
    State(app_state): State<AppState>,
    _guard: RequireFeature<RepairsTab>,
    Json(payload): Json<OpenRepairPayload>,
) -> Result<impl IntoResponse, AppError> {
    // A validação dos campos obrigatórios fica no serviço
    let job = app_state
        .mutate(|store| app_state.repair_service.open_job(store, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

// POST /api/repairs/{id}/status
pub async fn advance_repair(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<RepairsTab>,
    Path(job_id): Path<String>,
    Json(payload): Json<AdvanceRepairPayload>,
) -> Result<impl IntoResponse, AppError> {
    let job = app_state
        .mutate(|store| {
            app_state
                .repair_service
                .advance(store, &job_id, payload.status, &user.id)
        })
        .await?;
    Ok((StatusCode::OK, Json(job)))
}

// POST /api/repairs/{id}/cancel
pub async fn cancel_repair(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<RepairsTab>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let job = app_state
        .mutate(|store| app_state.repair_service.cancel(store, &job_id, &user.id))
        .await?;
    Ok((StatusCode::OK, Json(job)))
}

// POST /api/repairs/{id}/parts
pub async fn consume_part(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<RepairsTab>,
    Path(job_id): Path<String>,
    Json(payload): Json<ConsumePartPayload>,
) -> Result<impl IntoResponse, AppError> {
    let job = app_state
        .mutate(|store| {
            app_state.repair_service.consume_part(
                store,
                &job_id,
                &payload.part_id,
                payload.quantity,
                &user.id,
            )
        })
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

// DELETE /api/repairs/{id}
pub async fn delete_repair(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<RepairsTab>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.repair_service.remove_job(store, &job_id, &user))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
