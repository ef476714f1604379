// src/services/settings_service.rs

use validator::Validate;

use crate::{
    common::{error::AppError, ids::new_id},
    db::EntityStore,
    models::{
        employee::Employee,
        inventory::{InventoryCategory, UpsertCategoryPayload},
        settings::{Department, SiteConfig, UpdateSitePayload, UpsertDepartmentPayload},
    },
    services::access_policy::{ensure_can, Action},
};

/// Configuração do site e cadastros auxiliares (categorias, departamentos).
/// Só Admin.
#[derive(Clone, Default)]
pub struct SettingsService;

impl SettingsService {
    pub fn new() -> Self {
        Self
    }

    pub fn update_site(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        payload: UpdateSitePayload,
    ) -> Result<SiteConfig, AppError> {
        ensure_can(actor, Action::ConfigureSite)?;
        payload.validate()?;

        let site = SiteConfig {
            site_name: payload.site_name.trim().to_string(),
            currency: payload.currency.trim().to_string(),
        };
        if site.site_name.is_empty() {
            return Err(AppError::MissingField("siteName"));
        }
        if site.currency.is_empty() {
            return Err(AppError::MissingField("currency"));
        }
        store.set_site(site.clone());

        tracing::info!(site_name = %site.site_name, currency = %site.currency, "configuração do site atualizada");
        Ok(site)
    }

    pub fn save_category(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        payload: UpsertCategoryPayload,
    ) -> Result<InventoryCategory, AppError> {
        ensure_can(actor, Action::ConfigureSite)?;
        payload.validate()?;

        let category = InventoryCategory {
            id: payload.id.unwrap_or_else(|| new_id("cat")),
            name: payload.name,
            is_visible: payload.is_visible,
        };
        store.upsert_category(category.clone())?;
        Ok(category)
    }

    pub fn remove_category(&self, store: &mut EntityStore, actor: &Employee, id: &str) -> Result<InventoryCategory, AppError> {
        ensure_can(actor, Action::ConfigureSite)?;
        store.remove_category(id)
    }

    pub fn save_department(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        payload: UpsertDepartmentPayload,
    ) -> Result<Department, AppError> {
        ensure_can(actor, Action::ConfigureSite)?;
        payload.validate()?;

        let department = Department {
            id: payload.id.unwrap_or_else(|| new_id("dept")),
            name: payload.name,
        };
        store.upsert_department(department.clone())?;
        Ok(department)
    }

    pub fn remove_department(&self, store: &mut EntityStore, actor: &Employee, id: &str) -> Result<Department, AppError> {
        ensure_can(actor, Action::ConfigureSite)?;
        store.remove_department(id)
    }
}
