// src/handlers/billing.rs

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
        rbac::{BillingTab, RequireFeature},
    },
    models::billing::{GenerateInvoicePayload, PaymentPayload},
};

// GET /api/invoices
pub async fn list_invoices(
    State(app_state): State<AppState>,
    _guard: RequireFeature<BillingTab>,
) -> Result<impl IntoResponse, AppError> {
    let invoices = app_state.read(|store| store.invoices().list().to_vec()).await;
    Ok((StatusCode::OK, Json(invoices)))
}

// POST /api/invoices
pub async fn generate_invoice(
    State(app_state): State<AppState>,
    _guard: RequireFeature<BillingTab>,
    Json(payload): Json<GenerateInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state
        .mutate(|store| app_state.billing_service.generate_invoice(store, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

// POST /api/invoices/{id}/payments
pub async fn record_payment(
    State(app_state): State<AppState>,
    _guard: RequireFeature<BillingTab>,
    Path(invoice_id): Path<String>,
    Json(payload): Json<PaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state
        .mutate(|store| {
            app_state
                .billing_service
                .record_payment(store, &invoice_id, payload.amount)
        })
        .await?;
    Ok((StatusCode::OK, Json(invoice)))
}

// POST /api/invoices/{id}/mark-paid
pub async fn mark_paid(
    State(app_state): State<AppState>,
    _guard: RequireFeature<BillingTab>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = app_state
        .mutate(|store| app_state.billing_service.mark_paid(store, &invoice_id))
        .await?;
    Ok((StatusCode::OK, Json(invoice)))
}

// DELETE /api/invoices/{id}
pub async fn delete_invoice(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<BillingTab>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.billing_service.remove_invoice(store, &invoice_id, &user))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
