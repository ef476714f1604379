// src/handlers/settings.rs

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
        rbac::{RequireFeature, SettingsTab},
    },
    models::{
        inventory::UpsertCategoryPayload,
        settings::{UpdateSitePayload, UpsertDepartmentPayload},
    },
};

// GET /api/settings/site (pública: nome e moeda aparecem já na tela de login)
pub async fn get_site(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let site = app_state.read(|store| store.site().clone()).await;
    Ok((StatusCode::OK, Json(site)))
}

// PUT /api/settings/site
pub async fn update_site(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<SettingsTab>,
    Json(payload): Json<UpdateSitePayload>,
) -> Result<impl IntoResponse, AppError> {
    let site = app_state
        .mutate(|store| app_state.settings_service.update_site(store, &user, payload))
        .await?;
    Ok((StatusCode::OK, Json(site)))
}

// POST /api/settings/categories
pub async fn save_category(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<SettingsTab>,
    Json(payload): Json<UpsertCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let category = app_state
        .mutate(|store| app_state.settings_service.save_category(store, &user, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// DELETE /api/settings/categories/{id}
pub async fn delete_category(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<SettingsTab>,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.settings_service.remove_category(store, &user, &category_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/settings/departments (pública: o cadastro escolhe o departamento)
pub async fn list_departments(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let departments = app_state.read(|store| store.departments().list().to_vec()).await;
    Ok((StatusCode::OK, Json(departments)))
}

// POST /api/settings/departments
pub async fn save_department(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<SettingsTab>,
    Json(payload): Json<UpsertDepartmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let department = app_state
        .mutate(|store| app_state.settings_service.save_department(store, &user, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(department)))
}

// DELETE /api/settings/departments/{id}
pub async fn delete_department(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<SettingsTab>,
    Path(department_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.settings_service.remove_department(store, &user, &department_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
