// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::CurrentUser,
    models::{
        auth::{LoginPayload, RegisterPayload, SessionResponse},
        employee::{Employee, EmployeeProfile},
    },
    services::access_policy::permitted_tabs,
};

pub(crate) fn session_response(employee: &Employee) -> SessionResponse {
    SessionResponse {
        employee: EmployeeProfile::from(employee),
        permitted_tabs: permitted_tabs(employee.role),
    }
}

// POST /api/auth/login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let employee = app_state
        .auth_service
        .login(app_state.store(), payload.identifier.trim(), &payload.secret)
        .await?;

    Ok((StatusCode::OK, Json(session_response(&employee))))
}

// POST /api/auth/register
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // Codifica fora da guarda de escrita (bcrypt pode ir para outro thread)
    let password = app_state.auth_service.placeholder_password().await?;

    let employee = app_state
        .mutate(|store| app_state.auth_service.register(store, payload, password))
        .await?;

    // O recém-cadastrado já entra logado
    app_state.auth_service.sessions().set(employee.clone()).await;

    Ok((StatusCode::CREATED, Json(session_response(&employee))))
}

// POST /api/auth/logout
pub async fn logout(State(app_state): State<AppState>) -> StatusCode {
    app_state.auth_service.logout().await;
    StatusCode::NO_CONTENT
}

// GET /api/auth/me
pub async fn get_me(CurrentUser(employee): CurrentUser) -> Json<SessionResponse> {
    Json(session_response(&employee))
}
