// src/services/inventory_service.rs

use chrono::Utc;

use crate::{
    common::{
        error::AppError,
        ids::{new_id, SYSTEM_ACTOR},
    },
    db::{EntityStore, Record},
    models::{
        employee::Employee,
        inventory::{Part, Transaction, TransactionFilter, TransactionKind, TransactionStatus},
    },
    services::access_policy::{ensure_can, Action},
};

/// Ledger de estoque: pedidos de movimentação e a máquina de aprovação.
/// A aprovação é o único caminho que altera `Part::stock`.
#[derive(Clone, Default)]
pub struct InventoryService;

impl InventoryService {
    pub fn new() -> Self {
        Self
    }

    // --- CADASTRO DE PEÇA ---

    /// Cadastra (ou atualiza) uma peça. Para peça nova, o estoque de abertura
    /// entra como uma entrada já aprovada pelo sistema.
    pub fn save_part(
        &self,
        store: &mut EntityStore,
        part: Part,
        initial_stock: u32,
        requested_by: &str,
    ) -> Result<Part, AppError> {
        let is_new = !store.parts().contains(&part.id);
        let part_id = part.id.clone();

        // 1. Grava o cadastro (o store ignora qualquer saldo vindo de fora)
        store.upsert_part(part)?;

        // 2. Estoque de abertura
        if is_new && initial_stock > 0 {
            let opening = self.record_request(
                store,
                &part_id,
                i64::from(initial_stock),
                TransactionKind::StockIntake,
                requested_by,
                None,
                Some("Estoque de abertura".to_string()),
            )?;
            self.apply_approval(store, &opening.id, SYSTEM_ACTOR)?;
        }

        Ok(store.parts().require(&part_id)?.clone())
    }

    pub fn remove_part(&self, store: &mut EntityStore, part_id: &str, actor: &Employee) -> Result<Part, AppError> {
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_part(part_id)?;
        tracing::info!(part_id, actor = %actor.id, "peça removida");
        Ok(removed)
    }

    /// Só transações rejeitadas saem do histórico.
    pub fn remove_transaction(
        &self,
        store: &mut EntityStore,
        transaction_id: &str,
        actor: &Employee,
    ) -> Result<Transaction, AppError> {
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_transaction(transaction_id)?;
        tracing::info!(transaction_id, actor = %actor.id, "transação removida");
        Ok(removed)
    }

    // --- PEDIDO DE MOVIMENTAÇÃO ---

    /// Cria uma transação Pending. Nenhuma mudança de saldo ainda.
    pub fn request_transaction(
        &self,
        store: &mut EntityStore,
        part_id: &str,
        quantity: i64,
        kind: TransactionKind,
        requested_by: &str,
        note: Option<String>,
    ) -> Result<Transaction, AppError> {
        self.record_request(store, part_id, quantity, kind, requested_by, None, note)
    }

    pub(crate) fn record_request(
        &self,
        store: &mut EntityStore,
        part_id: &str,
        quantity: i64,
        kind: TransactionKind,
        requested_by: &str,
        repair_id: Option<String>,
        note: Option<String>,
    ) -> Result<Transaction, AppError> {
        let quantity = match u32::try_from(quantity) {
            Ok(q) if q > 0 => q,
            _ => return Err(AppError::InvalidQuantity(quantity)),
        };
        store.parts().require(part_id)?;

        let transaction = Transaction {
            id: new_id("TX"),
            part_id: part_id.to_string(),
            quantity,
            kind,
            status: TransactionStatus::Pending,
            requested_by: requested_by.to_string(),
            approved_by: None,
            timestamp: Utc::now(),
            resolved_at: None,
            repair_id,
            note,
        };
        store.transactions_mut().upsert(transaction.clone());

        tracing::info!(
            transaction_id = %transaction.id,
            part_id,
            quantity,
            kind = ?kind,
            requested_by,
            "transação de estoque solicitada"
        );
        Ok(transaction)
    }

    // --- APROVAÇÃO / REJEIÇÃO ---

    pub fn approve_transaction(
        &self,
        store: &mut EntityStore,
        transaction_id: &str,
        approver: &Employee,
    ) -> Result<Transaction, AppError> {
        ensure_can(approver, Action::ApproveTransaction)?;
        self.apply_approval(store, transaction_id, &approver.id)
    }

    /// Pending -> Approved, aplicando o delta com piso em zero.
    /// Consumo maior que o saldo é absorvido (política permissiva), não recusado.
    pub(crate) fn apply_approval(
        &self,
        store: &mut EntityStore,
        transaction_id: &str,
        approver_id: &str,
    ) -> Result<Transaction, AppError> {
        // 1. Checagens, antes de qualquer escrita
        let tx = store.transactions().require(transaction_id)?;
        ensure_pending(tx, TransactionStatus::Approved)?;
        let delta = tx.signed_quantity();
        let part_id = tx.part_id.clone();

        // 2. Saldo
        let part = store.parts_mut().require_mut(&part_id)?;
        let before = part.stock;
        let after = part.apply_delta(delta);
        if i64::from(before) + delta < 0 {
            tracing::warn!(
                transaction_id,
                part_id = %part_id,
                before,
                delta,
                "consumo acima do saldo; estoque travado em zero"
            );
        }

        // 3. Estado terminal
        let tx = store.transactions_mut().require_mut(transaction_id)?;
        tx.status = TransactionStatus::Approved;
        tx.approved_by = Some(approver_id.to_string());
        tx.resolved_at = Some(Utc::now());

        tracing::info!(transaction_id, part_id = %part_id, before, after, approver_id, "transação aprovada");
        Ok(tx.clone())
    }

    pub fn reject_transaction(
        &self,
        store: &mut EntityStore,
        transaction_id: &str,
        actor: &Employee,
    ) -> Result<Transaction, AppError> {
        ensure_can(actor, Action::ApproveTransaction)?;
        self.apply_rejection(store, transaction_id, &actor.id)
    }

    pub(crate) fn apply_rejection(
        &self,
        store: &mut EntityStore,
        transaction_id: &str,
        actor_id: &str,
    ) -> Result<Transaction, AppError> {
        let tx = store.transactions_mut().require_mut(transaction_id)?;
        ensure_pending(tx, TransactionStatus::Rejected)?;
        tx.status = TransactionStatus::Rejected;
        tx.resolved_at = Some(Utc::now());

        tracing::info!(transaction_id, actor_id, "transação rejeitada");
        Ok(tx.clone())
    }

    // --- CONSULTAS ---

    pub fn list_transactions(&self, store: &EntityStore, filter: &TransactionFilter) -> Vec<Transaction> {
        store
            .transactions()
            .iter()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.part_id.as_deref().is_none_or(|p| t.part_id == p))
            .cloned()
            .collect()
    }

    pub fn low_stock(&self, store: &EntityStore) -> Vec<Part> {
        store.low_stock_parts().into_iter().cloned().collect()
    }
}

fn ensure_pending(tx: &Transaction, to: TransactionStatus) -> Result<(), AppError> {
    if tx.is_pending() {
        return Ok(());
    }
    Err(AppError::InvalidStateTransition {
        entity: Transaction::ENTITY,
        id: tx.id.clone(),
        from: tx.status.to_string(),
        to: to.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::seed::seeded_store;

    fn admin(store: &EntityStore) -> Employee {
        store.employees().require("E001").unwrap().clone()
    }

    fn approved_sum(store: &EntityStore, part_id: &str) -> i64 {
        store
            .transactions()
            .iter()
            .filter(|t| t.part_id == part_id && t.status == TransactionStatus::Approved)
            .map(|t| t.signed_quantity())
            .sum()
    }

    #[test]
    fn intake_on_p002_goes_from_3_to_13_and_cannot_be_reapproved() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let approver = admin(&store);

        let tx = ledger
            .request_transaction(&mut store, "P002", 10, TransactionKind::StockIntake, "E002", None)
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(store.parts().require("P002").unwrap().stock, 3);

        let approved = ledger.approve_transaction(&mut store, &tx.id, &approver).unwrap();
        assert_eq!(approved.status, TransactionStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("E001"));
        assert_eq!(store.parts().require("P002").unwrap().stock, 13);

        let err = ledger.approve_transaction(&mut store, &tx.id, &approver).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(store.parts().require("P002").unwrap().stock, 13);
        assert_eq!(approved_sum(&store, "P002"), 13);
    }

    #[test]
    fn over_consumption_floors_at_zero_and_still_approves() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let approver = admin(&store);

        let tx = ledger
            .request_transaction(&mut store, "P002", 999, TransactionKind::StockUsage, "E002", None)
            .unwrap();
        let approved = ledger.approve_transaction(&mut store, &tx.id, &approver).unwrap();

        assert_eq!(approved.status, TransactionStatus::Approved);
        assert_eq!(store.parts().require("P002").unwrap().stock, 0);
        // Com piso, a dobra em ordem de aprovação continua explicando o saldo
        assert!(store.stock_discrepancies().is_empty());
    }

    #[test]
    fn non_positive_quantities_are_rejected_without_side_effects() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let before = store.transactions().len();

        for q in [0, -5] {
            let err = ledger
                .request_transaction(&mut store, "P001", q, TransactionKind::StockIntake, "E002", None)
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidQuantity(v) if v == q));
        }
        assert_eq!(store.transactions().len(), before);
    }

    #[test]
    fn unknown_part_is_not_found() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let err = ledger
            .request_transaction(&mut store, "P404", 1, TransactionKind::StockIntake, "E002", None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn rejection_is_terminal_and_has_no_stock_effect() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let approver = admin(&store);

        let tx = ledger
            .request_transaction(&mut store, "P001", 4, TransactionKind::StockUsage, "E002", None)
            .unwrap();
        ledger.reject_transaction(&mut store, &tx.id, &approver).unwrap();
        assert_eq!(store.parts().require("P001").unwrap().stock, 12);

        let err = ledger.approve_transaction(&mut store, &tx.id, &approver).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        let err = ledger.reject_transaction(&mut store, &tx.id, &approver).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(store.parts().require("P001").unwrap().stock, 12);
    }

    #[test]
    fn only_rejected_transactions_can_be_removed() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let approver = admin(&store);

        let kept = ledger
            .request_transaction(&mut store, "P001", 2, TransactionKind::StockIntake, "E002", None)
            .unwrap();
        let err = ledger.remove_transaction(&mut store, &kept.id, &approver).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        ledger.approve_transaction(&mut store, &kept.id, &approver).unwrap();
        assert!(ledger.remove_transaction(&mut store, &kept.id, &approver).is_err());

        let dropped = ledger
            .request_transaction(&mut store, "P001", 1, TransactionKind::StockUsage, "E002", None)
            .unwrap();
        ledger.reject_transaction(&mut store, &dropped.id, &approver).unwrap();
        ledger.remove_transaction(&mut store, &dropped.id, &approver).unwrap();

        assert!(!store.transactions().contains(&dropped.id));
        assert!(store.stock_discrepancies().is_empty());
    }

    #[test]
    fn staff_cannot_approve() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let mut staff = admin(&store);
        staff.role = crate::models::employee::Role::Staff;

        let tx = ledger
            .request_transaction(&mut store, "P001", 1, TransactionKind::StockIntake, "E002", None)
            .unwrap();
        let err = ledger.approve_transaction(&mut store, &tx.id, &staff).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(store.transactions().require(&tx.id).unwrap().is_pending());
    }

    #[test]
    fn stock_always_matches_approved_history() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let approver = admin(&store);

        let script = [
            (TransactionKind::StockIntake, 5, true),
            (TransactionKind::StockUsage, 2, true),
            (TransactionKind::Adjustment, 1, false),
            (TransactionKind::StockUsage, 7, true),
            (TransactionKind::StockIntake, 9, false),
            (TransactionKind::Adjustment, 3, true),
        ];
        for (kind, qty, approve) in script {
            let tx = ledger
                .request_transaction(&mut store, "P001", qty, kind, "E002", None)
                .unwrap();
            if approve {
                ledger.approve_transaction(&mut store, &tx.id, &approver).unwrap();
            } else {
                ledger.reject_transaction(&mut store, &tx.id, &approver).unwrap();
            }
            let stock = i64::from(store.parts().require("P001").unwrap().stock);
            assert_eq!(stock, approved_sum(&store, "P001"));
        }
        assert_eq!(store.parts().require("P001").unwrap().stock, 12 + 5 - 2 - 7 - 3);
    }

    #[test]
    fn new_part_opening_stock_is_an_approved_intake() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let part = Part {
            id: "P003".into(),
            name: "USB-C Port".into(),
            supplier: "TechParts Co".into(),
            category: "Charging Port".into(),
            stock: 999,
            min_stock_level: 2,
            sale_price: "35".parse().unwrap(),
            cost_price: "12".parse().unwrap(),
        };

        let saved = ledger.save_part(&mut store, part, 7, "E001").unwrap();
        assert_eq!(saved.stock, 7);
        assert!(store.stock_discrepancies().is_empty());

        let opening = ledger.list_transactions(
            &store,
            &TransactionFilter { status: None, part_id: Some("P003".into()) },
        );
        assert_eq!(opening.len(), 1);
        assert_eq!(opening[0].status, TransactionStatus::Approved);
    }

    #[test]
    fn part_in_unknown_category_is_refused() {
        let ledger = InventoryService::new();
        let mut store = seeded_store();
        let mut part = store.parts().require("P001").unwrap().clone();
        part.id = "P010".into();
        part.category = "Speakers".into();

        let err = ledger.save_part(&mut store, part, 3, "E001").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!store.parts().contains("P010"));
    }
}
