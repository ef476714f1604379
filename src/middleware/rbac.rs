// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::CurrentUser,
    services::access_policy::{ensure_access, Feature},
};

/// 1. O Trait que define qual aba protege a rota
pub trait FeatureDef: Send + Sync + 'static {
    fn feature() -> Feature;
}

/// 2. O Extractor (Guardião). Depende do `session_guard` ter rodado antes.
pub struct RequireFeature<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireFeature<T>
where
    T: FeatureDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .ok_or(AppError::Unauthenticated)?;

        ensure_access(&user.0, T::feature())?;
        Ok(RequireFeature(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS ABAS (TIPOS)
// ---

pub struct DashboardTab;
impl FeatureDef for DashboardTab {
    fn feature() -> Feature { Feature::Dashboard }
}

pub struct AssetsTab;
impl FeatureDef for AssetsTab {
    fn feature() -> Feature { Feature::Assets }
}

pub struct AssignmentsTab;
impl FeatureDef for AssignmentsTab {
    fn feature() -> Feature { Feature::Assignments }
}

pub struct InventoryTab;
impl FeatureDef for InventoryTab {
    fn feature() -> Feature { Feature::Inventory }
}

pub struct BillingTab;
impl FeatureDef for BillingTab {
    fn feature() -> Feature { Feature::Billing }
}

pub struct RepairsTab;
impl FeatureDef for RepairsTab {
    fn feature() -> Feature { Feature::Repairs }
}

pub struct ReportsTab;
impl FeatureDef for ReportsTab {
    fn feature() -> Feature { Feature::Reports }
}

pub struct EmployeesTab;
impl FeatureDef for EmployeesTab {
    fn feature() -> Feature { Feature::Employees }
}

pub struct SettingsTab;
impl FeatureDef for SettingsTab {
    fn feature() -> Feature { Feature::Settings }
}
