// src/services/assignment_service.rs

use chrono::Utc;

use crate::{
    common::{error::AppError, ids::new_id},
    db::EntityStore,
    models::{
        asset::{Asset, AssetStatus, Assignment, UpsertAssetPayload},
        employee::Employee,
    },
    services::access_policy::{ensure_can, Action},
};

/// Checkout / checkin de ativos. Cada operação roda inteira sob a guarda
/// de escrita do store, então checagem e efeito não se separam.
#[derive(Clone, Default)]
pub struct AssignmentService;

impl AssignmentService {
    pub fn new() -> Self {
        Self
    }

    pub fn checkout(
        &self,
        store: &mut EntityStore,
        asset_id: &str,
        employee_id: &str,
    ) -> Result<Assignment, AppError> {
        // 1. Existência
        let asset = store.assets().require(asset_id)?;
        store.employees().require(employee_id)?;

        // 2. No máximo uma atribuição aberta por ativo
        if store.open_assignment_for(asset_id).is_some() {
            return Err(AppError::AlreadyAssigned(asset_id.to_string()));
        }
        if asset.status != AssetStatus::Available {
            return Err(AppError::NotAvailable {
                asset_id: asset_id.to_string(),
                status: asset.status.to_string(),
            });
        }

        // 3. Efeito
        let assignment = Assignment {
            id: new_id("ASG"),
            asset_id: asset_id.to_string(),
            employee_id: employee_id.to_string(),
            checkout_date: Utc::now(),
            return_date: None,
        };
        store.assignments_mut().upsert(assignment.clone());
        store.assets_mut().require_mut(asset_id)?.status = AssetStatus::Assigned;

        tracing::info!(assignment_id = %assignment.id, asset_id, employee_id, "checkout registrado");
        Ok(assignment)
    }

    pub fn checkin(&self, store: &mut EntityStore, assignment_id: &str) -> Result<Assignment, AppError> {
        let assignment = store.assignments().require(assignment_id)?;
        if !assignment.is_open() {
            return Err(AppError::NotOpen(assignment_id.to_string()));
        }
        let asset_id = assignment.asset_id.clone();

        let assignment = store.assignments_mut().require_mut(assignment_id)?;
        assignment.return_date = Some(Utc::now());
        let returned = assignment.clone();

        // O ativo pode ter sido removido por fora; a devolução vale mesmo assim
        match store.assets_mut().require_mut(&asset_id) {
            Ok(asset) => asset.status = AssetStatus::Available,
            Err(_) => tracing::warn!(assignment_id, asset_id = %asset_id, "ativo da atribuição não existe mais"),
        }

        tracing::info!(assignment_id, asset_id = %asset_id, "checkin registrado");
        Ok(returned)
    }

    pub fn assignments_for_employee(&self, store: &EntityStore, employee_id: &str) -> Vec<Assignment> {
        store
            .assignments()
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect()
    }

    // --- Registro de hardware ---

    pub fn save_asset(&self, store: &mut EntityStore, payload: UpsertAssetPayload) -> Result<Asset, AppError> {
        let id = payload.id.unwrap_or_else(|| new_id("ASSET"));
        let status = match (payload.status, store.assets().get(&id)) {
            (Some(status), _) => status,
            (None, Some(current)) => current.status,
            (None, None) => AssetStatus::Available,
        };
        let asset = Asset {
            id: id.clone(),
            tag: payload.tag,
            serial_number: payload.serial_number,
            model: payload.model,
            category: payload.category,
            specs: payload.specs,
            status,
            purchase_date: payload.purchase_date,
            warranty_expiry: payload.warranty_expiry,
        };
        store.upsert_asset(asset)?;
        Ok(store.assets().require(&id)?.clone())
    }

    pub fn remove_asset(&self, store: &mut EntityStore, asset_id: &str, actor: &Employee) -> Result<Asset, AppError> {
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_asset(asset_id)?;
        tracing::info!(asset_id, actor = %actor.id, "ativo removido");
        Ok(removed)
    }

    pub fn remove_assignment(
        &self,
        store: &mut EntityStore,
        assignment_id: &str,
        actor: &Employee,
    ) -> Result<Assignment, AppError> {
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_assignment(assignment_id)?;
        tracing::info!(assignment_id, actor = %actor.id, "atribuição removida");
        Ok(removed)
    }
}
