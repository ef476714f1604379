// src/services/repair_service.rs

use chrono::Utc;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        ids::{new_id, SYSTEM_ACTOR},
    },
    db::{EntityStore, Record},
    models::{
        asset::AssetStatus,
        employee::Employee,
        inventory::TransactionKind,
        repair::{OpenRepairPayload, PartUsage, RepairJob, RepairStatus},
    },
    services::{
        access_policy::{ensure_can, Action},
        inventory_service::InventoryService,
    },
};

/// Fluxo de reparo: Received -> In Progress -> Completed -> Delivered,
/// com Cancelled a partir de qualquer etapa em aberto.
#[derive(Clone)]
pub struct RepairService {
    inventory: InventoryService,
    // Consumo de peça já sai aprovado (pelo sistema) quando ligado
    auto_approve: bool,
}

impl RepairService {
    pub fn new(inventory: InventoryService, auto_approve: bool) -> Self {
        Self { inventory, auto_approve }
    }

    pub fn open_job(&self, store: &mut EntityStore, payload: OpenRepairPayload) -> Result<RepairJob, AppError> {
        payload.validate()?;
        if payload.labor_cost.is_sign_negative() {
            return Err(AppError::InvalidAmount(format!(
                "mão de obra não pode ser negativa: {}",
                payload.labor_cost
            )));
        }

        // Ativo opcional; string vazia conta como ausente
        let asset_id = payload.asset_id.filter(|id| !id.trim().is_empty());
        let mark_in_repair = match asset_id.as_deref() {
            Some(id) => store.assets().require(id)?.status == AssetStatus::Available,
            None => false,
        };

        let job = RepairJob {
            id: new_id("JOB"),
            asset_id,
            device_model: payload.device_model,
            customer_name: payload.customer_name,
            customer_phone: payload.customer_phone,
            issue: payload.issue,
            status: RepairStatus::Received,
            parts_used: Vec::new(),
            labor_cost: payload.labor_cost,
            created_at: Utc::now(),
            closed_at: None,
        };

        if mark_in_repair {
            if let Some(id) = job.asset_id.as_deref() {
                store.assets_mut().require_mut(id)?.status = AssetStatus::InRepair;
            }
        }
        store.repairs_mut().upsert(job.clone());

        tracing::info!(job_id = %job.id, customer = %job.customer_name, "reparo aberto");
        Ok(job)
    }

    /// Avança para `to`. Pular etapas ou voltar é transição inválida.
    pub fn advance(
        &self,
        store: &mut EntityStore,
        job_id: &str,
        to: RepairStatus,
        actor_id: &str,
    ) -> Result<RepairJob, AppError> {
        if to == RepairStatus::Cancelled {
            return self.cancel(store, job_id, actor_id);
        }

        let job = store.repairs().require(job_id)?;
        ensure_transition(job, to)?;

        let job = store.repairs_mut().require_mut(job_id)?;
        let from = job.status;
        job.status = to;
        if to.is_terminal() {
            job.closed_at = Some(Utc::now());
        }
        let job = job.clone();

        if to.is_terminal() {
            release_asset(store, &job);
        }

        tracing::info!(job_id, %from, %to, actor_id, "status do reparo alterado");
        Ok(job)
    }

    /// Cancela o reparo e rejeita as transações ainda pendentes que ele gerou.
    pub fn cancel(&self, store: &mut EntityStore, job_id: &str, actor_id: &str) -> Result<RepairJob, AppError> {
        let job = store.repairs().require(job_id)?;
        ensure_transition(job, RepairStatus::Cancelled)?;

        let pending: Vec<String> = store
            .transactions()
            .iter()
            .filter(|t| t.repair_id.as_deref() == Some(job_id) && t.is_pending())
            .map(|t| t.id.clone())
            .collect();
        for tx_id in &pending {
            self.inventory.apply_rejection(store, tx_id, actor_id)?;
        }

        let job = store.repairs_mut().require_mut(job_id)?;
        job.status = RepairStatus::Cancelled;
        job.closed_at = Some(Utc::now());
        let job = job.clone();
        release_asset(store, &job);

        tracing::info!(job_id, actor_id, rejected = pending.len(), "reparo cancelado");
        Ok(job)
    }

    /// Consome peça pelo ledger (Stock Usage com `repairId`).
    pub fn consume_part(
        &self,
        store: &mut EntityStore,
        job_id: &str,
        part_id: &str,
        quantity: i64,
        requested_by: &str,
    ) -> Result<RepairJob, AppError> {
        let job = store.repairs().require(job_id)?;
        if !job.status.accepts_parts() {
            return Err(AppError::InvalidStateTransition {
                entity: RepairJob::ENTITY,
                id: job_id.to_string(),
                from: job.status.to_string(),
                to: "Part Usage".to_string(),
            });
        }

        let tx = self.inventory.record_request(
            store,
            part_id,
            quantity,
            TransactionKind::StockUsage,
            requested_by,
            Some(job_id.to_string()),
            None,
        )?;
        if self.auto_approve {
            self.inventory.apply_approval(store, &tx.id, SYSTEM_ACTOR)?;
        }

        let job = store.repairs_mut().require_mut(job_id)?;
        job.parts_used.push(PartUsage {
            part_id: part_id.to_string(),
            quantity: tx.quantity,
            transaction_id: tx.id.clone(),
        });
        Ok(job.clone())
    }

    /// Só reparos terminais e ainda não faturados saem do histórico.
    pub fn remove_job(&self, store: &mut EntityStore, job_id: &str, actor: &Employee) -> Result<RepairJob, AppError> {
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_repair(job_id)?;
        tracing::info!(job_id, actor = %actor.id, "reparo removido");
        Ok(removed)
    }
}

fn ensure_transition(job: &RepairJob, to: RepairStatus) -> Result<(), AppError> {
    if job.status.can_transition_to(to) {
        return Ok(());
    }
    Err(AppError::InvalidStateTransition {
        entity: RepairJob::ENTITY,
        id: job.id.clone(),
        from: job.status.to_string(),
        to: to.to_string(),
    })
}

// Devolve o ativo quando nenhum outro reparo aberto o segura
fn release_asset(store: &mut EntityStore, job: &RepairJob) {
    let Some(asset_id) = job.asset_id.as_deref() else {
        return;
    };
    let still_held = store
        .repairs()
        .iter()
        .any(|j| j.id != job.id && j.asset_id.as_deref() == Some(asset_id) && !j.status.is_terminal());
    if still_held {
        return;
    }
    if let Ok(asset) = store.assets_mut().require_mut(asset_id) {
        if asset.status == AssetStatus::InRepair {
            asset.status = AssetStatus::Available;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::seed::seeded_store;
    use crate::models::inventory::TransactionStatus;
    use rust_decimal::Decimal;

    fn payload(asset_id: Option<&str>) -> OpenRepairPayload {
        OpenRepairPayload {
            asset_id: asset_id.map(str::to_string),
            device_model: "iPhone 15 Pro".into(),
            customer_name: "Ana Souza".into(),
            customer_phone: Some("555-0101".into()),
            issue: "Tela trincada".into(),
            labor_cost: Decimal::from(40),
        }
    }

    #[test]
    fn full_lifecycle_moves_asset_in_and_out_of_repair() {
        let workflow = RepairService::new(InventoryService::new(), true);
        let mut store = seeded_store();

        let job = workflow.open_job(&mut store, payload(Some("ASSET-1"))).unwrap();
        assert_eq!(job.status, RepairStatus::Received);
        assert_eq!(store.assets().require("ASSET-1").unwrap().status, AssetStatus::InRepair);

        for to in [RepairStatus::InProgress, RepairStatus::Completed, RepairStatus::Delivered] {
            workflow.advance(&mut store, &job.id, to, "E002").unwrap();
        }
        let done = store.repairs().require(&job.id).unwrap();
        assert_eq!(done.status, RepairStatus::Delivered);
        assert!(done.closed_at.is_some());
        assert_eq!(store.assets().require("ASSET-1").unwrap().status, AssetStatus::Available);
    }

    #[test]
    fn skipping_or_going_back_is_a_state_conflict() {
        let workflow = RepairService::new(InventoryService::new(), true);
        let mut store = seeded_store();
        let job = workflow.open_job(&mut store, payload(None)).unwrap();

        let err = workflow
            .advance(&mut store, &job.id, RepairStatus::Completed, "E002")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        workflow.advance(&mut store, &job.id, RepairStatus::InProgress, "E002").unwrap();
        let err = workflow
            .advance(&mut store, &job.id, RepairStatus::Received, "E002")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(store.repairs().require(&job.id).unwrap().status, RepairStatus::InProgress);
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let workflow = RepairService::new(InventoryService::new(), true);
        let mut store = seeded_store();
        let mut bad = payload(None);
        bad.customer_name.clear();

        let err = workflow.open_job(&mut store, bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.repairs().is_empty());
    }

    #[test]
    fn consuming_a_part_goes_through_the_ledger() {
        let workflow = RepairService::new(InventoryService::new(), true);
        let mut store = seeded_store();
        let job = workflow.open_job(&mut store, payload(None)).unwrap();

        let job = workflow.consume_part(&mut store, &job.id, "P001", 2, "E002").unwrap();
        assert_eq!(job.parts_used.len(), 1);
        assert_eq!(store.parts().require("P001").unwrap().stock, 10);

        let tx = store.transactions().require(&job.parts_used[0].transaction_id).unwrap();
        assert_eq!(tx.kind, TransactionKind::StockUsage);
        assert_eq!(tx.status, TransactionStatus::Approved);
        assert_eq!(tx.repair_id.as_deref(), Some(job.id.as_str()));
        assert!(store.stock_discrepancies().is_empty());
    }

    #[test]
    fn completed_jobs_do_not_accept_parts() {
        let workflow = RepairService::new(InventoryService::new(), true);
        let mut store = seeded_store();
        let job = workflow.open_job(&mut store, payload(None)).unwrap();
        workflow.advance(&mut store, &job.id, RepairStatus::InProgress, "E002").unwrap();
        workflow.advance(&mut store, &job.id, RepairStatus::Completed, "E002").unwrap();
        let before = store.transactions().len();

        let err = workflow.consume_part(&mut store, &job.id, "P001", 1, "E002").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(store.transactions().len(), before);
        assert_eq!(store.parts().require("P001").unwrap().stock, 12);
    }

    #[test]
    fn cancel_rejects_pending_usage_without_touching_stock() {
        let workflow = RepairService::new(InventoryService::new(), false);
        let mut store = seeded_store();
        let job = workflow.open_job(&mut store, payload(Some("ASSET-2"))).unwrap();
        let job = workflow.consume_part(&mut store, &job.id, "P002", 1, "E002").unwrap();
        let tx_id = job.parts_used[0].transaction_id.clone();
        assert!(store.transactions().require(&tx_id).unwrap().is_pending());

        let cancelled = workflow.cancel(&mut store, &job.id, "E002").unwrap();
        assert_eq!(cancelled.status, RepairStatus::Cancelled);
        assert_eq!(store.transactions().require(&tx_id).unwrap().status, TransactionStatus::Rejected);
        assert_eq!(store.parts().require("P002").unwrap().stock, 3);
        assert_eq!(store.assets().require("ASSET-2").unwrap().status, AssetStatus::Available);

        let err = workflow.cancel(&mut store, &job.id, "E002").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }
}
