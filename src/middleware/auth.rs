// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{common::error::AppError, config::AppState, models::employee::Employee};

// O middleware em si: exige a sessão e injeta o funcionário nos "extensions"
pub async fn session_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = app_state
        .auth_service
        .current()
        .await
        .ok_or(AppError::Unauthenticated)?;

    // Relê do store: cargo, flags e status podem ter mudado desde o login
    let current = app_state
        .read(|store| store.employees().get(&session.id).cloned())
        .await;

    let Some(employee) = current else {
        app_state.auth_service.sessions().forget(&session.id).await;
        return Err(AppError::Unauthenticated);
    };

    request.extensions_mut().insert(CurrentUser(employee));
    Ok(next.run(request).await)
}

// Extrator para obter o funcionário logado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Employee);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
