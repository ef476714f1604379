// src/handlers/employees.rs

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
        rbac::{EmployeesTab, RequireFeature},
    },
    models::employee::{Employee, EmployeeProfile, Permissions, SetRolePayload, UpdateProfilePayload},
};

// Se o editado for o próprio logado, a sessão acompanha
async fn respond(app_state: &AppState, employee: Employee) -> Json<EmployeeProfile> {
    app_state.auth_service.sessions().refresh(&employee).await;
    Json(EmployeeProfile::from(&employee))
}

// GET /api/employees
pub async fn list_employees(
    State(app_state): State<AppState>,
    _guard: RequireFeature<EmployeesTab>,
) -> Result<impl IntoResponse, AppError> {
    let profiles: Vec<EmployeeProfile> = app_state
        .read(|store| {
            app_state
                .staff_service
                .list(store)
                .iter()
                .map(EmployeeProfile::from)
                .collect()
        })
        .await;
    Ok((StatusCode::OK, Json(profiles)))
}

// PUT /api/employees/{id}
pub async fn update_profile(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<EmployeesTab>,
    Path(employee_id): Path<String>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state
        .mutate(|store| {
            app_state
                .staff_service
                .update_profile(store, &user, &employee_id, payload)
        })
        .await?;
    Ok((StatusCode::OK, respond(&app_state, employee).await))
}

// POST /api/employees/{id}/approve
pub async fn approve_employee(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<EmployeesTab>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state
        .mutate(|store| app_state.staff_service.approve_employee(store, &user, &employee_id))
        .await?;
    Ok((StatusCode::OK, respond(&app_state, employee).await))
}

// PUT /api/employees/{id}/role
pub async fn set_role(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<EmployeesTab>,
    Path(employee_id): Path<String>,
    Json(payload): Json<SetRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state
        .mutate(|store| {
            app_state
                .staff_service
                .set_role(store, &user, &employee_id, payload.role)
        })
        .await?;
    Ok((StatusCode::OK, respond(&app_state, employee).await))
}

// PUT /api/employees/{id}/permissions
pub async fn set_permissions(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<EmployeesTab>,
    Path(employee_id): Path<String>,
    Json(permissions): Json<Permissions>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state
        .mutate(|store| {
            app_state
                .staff_service
                .set_permissions(store, &user, &employee_id, permissions)
        })
        .await?;
    Ok((StatusCode::OK, respond(&app_state, employee).await))
}

// POST /api/employees/{id}/deactivate
pub async fn deactivate_employee(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<EmployeesTab>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state
        .mutate(|store| app_state.staff_service.deactivate(store, &user, &employee_id))
        .await?;
    Ok((StatusCode::OK, respond(&app_state, employee).await))
}

// DELETE /api/employees/{id}
pub async fn delete_employee(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<EmployeesTab>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.staff_service.remove(store, &user, &employee_id))
        .await?;
    app_state.auth_service.sessions().forget(&employee_id).await;
    Ok(StatusCode::NO_CONTENT)
}
