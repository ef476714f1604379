//! Back office de uma assistência técnica: ativos, estoque de peças,
//! reparos, faturamento e equipe, atrás de uma API JSON.

pub mod common;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{config::AppState, middleware::auth::session_guard};

/// Monta todas as rotas sob `/api`.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout));

    let public_settings = Router::new()
        .route("/site", get(handlers::settings::get_site))
        .route("/departments", get(handlers::settings::list_departments));

    // Rotas protegidas pela sessão
    let me_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let inventory_routes = Router::new()
        .route(
            "/parts",
            get(handlers::inventory::list_parts).post(handlers::inventory::save_part),
        )
        .route("/parts/{id}", delete(handlers::inventory::delete_part))
        .route("/low-stock", get(handlers::inventory::low_stock))
        .route("/categories", get(handlers::inventory::list_categories))
        .route(
            "/transactions",
            get(handlers::inventory::list_transactions).post(handlers::inventory::request_transaction),
        )
        .route("/transactions/{id}", delete(handlers::inventory::delete_transaction))
        .route("/transactions/{id}/approve", post(handlers::inventory::approve_transaction))
        .route("/transactions/{id}/reject", post(handlers::inventory::reject_transaction));

    let asset_routes = Router::new()
        .route("/", get(handlers::assets::list_assets).post(handlers::assets::save_asset))
        .route("/{id}", delete(handlers::assets::delete_asset));

    let assignment_routes = Router::new()
        .route("/", get(handlers::assets::list_assignments))
        .route("/checkout", post(handlers::assets::checkout))
        .route("/{id}", delete(handlers::assets::delete_assignment))
        .route("/{id}/checkin", post(handlers::assets::checkin));

    let repair_routes = Router::new()
        .route("/", get(handlers::repairs::list_repairs).post(handlers::repairs::open_repair))
        .route("/{id}", delete(handlers::repairs::delete_repair))
        .route("/{id}/status", post(handlers::repairs::advance_repair))
        .route("/{id}/cancel", post(handlers::repairs::cancel_repair))
        .route("/{id}/parts", post(handlers::repairs::consume_part));

    let invoice_routes = Router::new()
        .route("/", get(handlers::billing::list_invoices).post(handlers::billing::generate_invoice))
        .route("/{id}", delete(handlers::billing::delete_invoice))
        .route("/{id}/payments", post(handlers::billing::record_payment))
        .route("/{id}/mark-paid", post(handlers::billing::mark_paid));

    let employee_routes = Router::new()
        .route("/", get(handlers::employees::list_employees))
        .route(
            "/{id}",
            put(handlers::employees::update_profile).delete(handlers::employees::delete_employee),
        )
        .route("/{id}/approve", post(handlers::employees::approve_employee))
        .route("/{id}/role", put(handlers::employees::set_role))
        .route("/{id}/permissions", put(handlers::employees::set_permissions))
        .route("/{id}/deactivate", post(handlers::employees::deactivate_employee));

    let settings_routes = Router::new()
        .route("/site", put(handlers::settings::update_site))
        .route("/categories", post(handlers::settings::save_category))
        .route("/categories/{id}", delete(handlers::settings::delete_category))
        .route("/departments", post(handlers::settings::save_department))
        .route("/departments/{id}", delete(handlers::settings::delete_department));

    let protected = Router::new()
        .nest("/auth", me_routes)
        .nest("/inventory", inventory_routes)
        .nest("/assets", asset_routes)
        .nest("/assignments", assignment_routes)
        .nest("/repairs", repair_routes)
        .nest("/invoices", invoice_routes)
        .nest("/employees", employee_routes)
        .nest("/settings", settings_routes)
        .route("/dashboard", get(handlers::dashboard::get_summary))
        .route("/reports", get(handlers::dashboard::get_report))
        .route("/reports/export", get(handlers::dashboard::export_report))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_guard,
        ));

    let public = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth_routes)
        .nest("/settings", public_settings);

    // Combina tudo no router principal
    Router::new()
        .nest("/api", public.merge(protected))
        .with_state(app_state)
}
