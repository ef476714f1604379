// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::CurrentUser,
        rbac::{DashboardTab, ReportsTab, RequireFeature},
    },
};

// GET /api/dashboard
pub async fn get_summary(
    State(app_state): State<AppState>,
    _guard: RequireFeature<DashboardTab>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state
        .read(|store| app_state.dashboard_service.get_summary(store))
        .await;
    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/reports
pub async fn get_report(
    State(app_state): State<AppState>,
    _guard: RequireFeature<ReportsTab>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state
        .read(|store| app_state.dashboard_service.get_report(store))
        .await;
    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/export
pub async fn export_report(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<ReportsTab>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state
        .read(|store| app_state.dashboard_service.export_report(store, &user))
        .await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_DISPOSITION, "attachment; filename=\"mobifix-report.json\"")],
        Json(report),
    ))
}
