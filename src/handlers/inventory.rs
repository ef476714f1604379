// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{error::AppError, ids::new_id},
    config::AppState,
    middleware::{
        auth::CurrentUser,
        rbac::{InventoryTab, RequireFeature},
    },
    models::inventory::{Part, RequestTransactionPayload, TransactionFilter, UpsertPartPayload},
};

// ---
// Peças
// ---

// GET /api/inventory/parts
pub async fn list_parts(
    State(app_state): State<AppState>,
    _guard: RequireFeature<InventoryTab>,
) -> Result<impl IntoResponse, AppError> {
    let parts = app_state.read(|store| store.parts().list().to_vec()).await;
    Ok((StatusCode::OK, Json(parts)))
}

// POST /api/inventory/parts (cria ou atualiza; o saldo nunca vem do payload)
pub async fn save_part(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<InventoryTab>,
    Json(payload): Json<UpsertPartPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let initial_stock = payload.initial_stock;
    let part = Part {
        id: payload.id.unwrap_or_else(|| new_id("P")),
        name: payload.name,
        supplier: payload.supplier,
        category: payload.category,
        stock: 0,
        min_stock_level: payload.min_stock_level,
        sale_price: payload.sale_price,
        cost_price: payload.cost_price,
    };

    let saved = app_state
        .mutate(|store| {
            app_state
                .inventory_service
                .save_part(store, part, initial_stock, &user.id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

// DELETE /api/inventory/parts/{id}
pub async fn delete_part(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<InventoryTab>,
    Path(part_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| app_state.inventory_service.remove_part(store, &part_id, &user))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/inventory/low-stock
pub async fn low_stock(
    State(app_state): State<AppState>,
    _guard: RequireFeature<InventoryTab>,
) -> Result<impl IntoResponse, AppError> {
    let parts = app_state
        .read(|store| app_state.inventory_service.low_stock(store))
        .await;
    Ok((StatusCode::OK, Json(parts)))
}

// GET /api/inventory/categories
pub async fn list_categories(
    State(app_state): State<AppState>,
    _guard: RequireFeature<InventoryTab>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state
        .read(|store| store.inventory_categories().list().to_vec())
        .await;
    Ok((StatusCode::OK, Json(categories)))
}

// ---
// Transações
// ---

// GET /api/inventory/transactions?status=Pending&partId=P001
pub async fn list_transactions(
    State(app_state): State<AppState>,
    _guard: RequireFeature<InventoryTab>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state
        .read(|store| app_state.inventory_service.list_transactions(store, &filter))
        .await;
    Ok((StatusCode::OK, Json(transactions)))
}

// POST /api/inventory/transactions
pub async fn request_transaction(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<InventoryTab>,
    Json(payload): Json<RequestTransactionPayload>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = app_state
        .mutate(|store| {
            app_state.inventory_service.request_transaction(
                store,
                &payload.part_id,
                payload.quantity,
                payload.kind,
                &user.id,
                payload.note,
            )
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

// POST /api/inventory/transactions/{id}/approve
pub async fn approve_transaction(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<InventoryTab>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = app_state
        .mutate(|store| {
            app_state
                .inventory_service
                .approve_transaction(store, &transaction_id, &user)
        })
        .await?;

    Ok((StatusCode::OK, Json(transaction)))
}

// POST /api/inventory/transactions/{id}/reject
pub async fn reject_transaction(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<InventoryTab>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = app_state
        .mutate(|store| {
            app_state
                .inventory_service
                .reject_transaction(store, &transaction_id, &user)
        })
        .await?;

    Ok((StatusCode::OK, Json(transaction)))
}

// DELETE /api/inventory/transactions/{id}
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    _guard: RequireFeature<InventoryTab>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .mutate(|store| {
            app_state
                .inventory_service
                .remove_transaction(store, &transaction_id, &user)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
