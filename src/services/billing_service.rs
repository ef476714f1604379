// src/services/billing_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use validator::Validate;

use crate::{
    common::{error::AppError, ids::new_id},
    db::{EntityStore, Record},
    models::{
        billing::{GenerateInvoicePayload, Invoice, LineItem, PaymentStatus},
        employee::Employee,
        inventory::TransactionStatus,
        repair::RepairJob,
    },
    services::access_policy::{ensure_can, Action},
};

#[derive(Clone, Default)]
pub struct BillingService;

impl BillingService {
    pub fn new() -> Self {
        Self
    }

    /// Fatura um reparo concluído. Só entram as peças cujo consumo foi aprovado,
    /// pelo preço de venda atual.
    pub fn generate_invoice(
        &self,
        store: &mut EntityStore,
        payload: GenerateInvoicePayload,
    ) -> Result<Invoice, AppError> {
        payload.validate()?;
        if let Some(item) = payload.extra_items.iter().find(|i| i.unit_price.is_sign_negative()) {
            return Err(AppError::InvalidAmount(format!(
                "preço unitário negativo em '{}'",
                item.description
            )));
        }

        // 1. Reparo faturável e ainda sem fatura
        let job = store.repairs().require(&payload.repair_id)?;
        if !job.status.is_billable() {
            return Err(AppError::InvalidStateTransition {
                entity: RepairJob::ENTITY,
                id: job.id.clone(),
                from: job.status.to_string(),
                to: "Invoiced".to_string(),
            });
        }
        if store
            .invoices()
            .iter()
            .any(|i| i.repair_id.as_deref() == Some(job.id.as_str()))
        {
            return Err(AppError::InvoiceAlreadyExists(job.id.clone()));
        }

        // 2. Itens
        let mut items = Vec::new();
        for usage in &job.parts_used {
            let approved = store
                .transactions()
                .get(&usage.transaction_id)
                .is_some_and(|t| t.status == TransactionStatus::Approved);
            if !approved {
                continue;
            }
            let Some(part) = store.parts().get(&usage.part_id) else {
                tracing::warn!(job_id = %job.id, part_id = %usage.part_id, "peça faturada não existe mais; item ignorado");
                continue;
            };
            items.push(LineItem {
                description: part.name.clone(),
                quantity: usage.quantity,
                unit_price: part.sale_price,
                part_id: Some(part.id.clone()),
            });
        }
        if job.labor_cost > Decimal::ZERO {
            items.push(LineItem {
                description: "Labor".to_string(),
                quantity: 1,
                unit_price: job.labor_cost,
                part_id: None,
            });
        }
        items.extend(payload.extra_items);

        let total = invoice_total(&items)?;

        // 3. Fatura
        let invoice = Invoice {
            id: new_id("INV"),
            repair_id: Some(job.id.clone()),
            customer_name: job.customer_name.clone(),
            total,
            items,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::Unpaid,
            issued_at: Utc::now(),
        };
        store.invoices_mut().upsert(invoice.clone());

        tracing::info!(
            invoice_id = %invoice.id,
            repair_id = %payload.repair_id,
            total = %store.site().format_amount(invoice.total),
            "fatura gerada"
        );
        Ok(invoice)
    }

    pub fn record_payment(
        &self,
        store: &mut EntityStore,
        invoice_id: &str,
        amount: Decimal,
    ) -> Result<Invoice, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(format!("pagamento deve ser positivo: {amount}")));
        }
        let invoice = store.invoices_mut().require_mut(invoice_id)?;
        ensure_open(invoice)?;

        invoice.amount_paid = invoice
            .amount_paid
            .checked_add(amount)
            .ok_or_else(|| AppError::InvalidAmount(format!("pagamento grande demais: {amount}")))?;
        invoice.payment_status = if invoice.amount_paid >= invoice.total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::PartiallyPaid
        };
        let invoice = invoice.clone();

        tracing::info!(invoice_id, %amount, status = %invoice.payment_status, "pagamento registrado");
        Ok(invoice)
    }

    /// Quita o saldo restante.
    pub fn mark_paid(&self, store: &mut EntityStore, invoice_id: &str) -> Result<Invoice, AppError> {
        let invoice = store.invoices_mut().require_mut(invoice_id)?;
        ensure_open(invoice)?;

        invoice.amount_paid = invoice.amount_paid.max(invoice.total);
        invoice.payment_status = PaymentStatus::Paid;
        let invoice = invoice.clone();

        tracing::info!(invoice_id, "fatura quitada");
        Ok(invoice)
    }

    /// Só faturas quitadas podem sair.
    pub fn remove_invoice(&self, store: &mut EntityStore, invoice_id: &str, actor: &Employee) -> Result<Invoice, AppError> {
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_invoice(invoice_id)?;
        tracing::info!(invoice_id, actor = %actor.id, "fatura removida");
        Ok(removed)
    }
}

fn invoice_total(items: &[LineItem]) -> Result<Decimal, AppError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| AppError::InvalidAmount(format!("total da fatura estoura em '{}'", item.description)))
    })
}

fn ensure_open(invoice: &Invoice) -> Result<(), AppError> {
    if invoice.payment_status != PaymentStatus::Paid {
        return Ok(());
    }
    Err(AppError::InvalidStateTransition {
        entity: Invoice::ENTITY,
        id: invoice.id.clone(),
        from: invoice.payment_status.to_string(),
        to: "Payment".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::seed::seeded_store;
    use crate::models::repair::{OpenRepairPayload, RepairStatus};
    use crate::services::{inventory_service::InventoryService, repair_service::RepairService};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // Reparo com 1x P001 consumido e R$ 40 de mão de obra, já concluído
    fn completed_job(store: &mut EntityStore) -> String {
        let workflow = RepairService::new(InventoryService::new(), true);
        let job = workflow
            .open_job(
                store,
                OpenRepairPayload {
                    asset_id: None,
                    device_model: "iPhone 15 Pro".into(),
                    customer_name: "Ana Souza".into(),
                    customer_phone: None,
                    issue: "Tela trincada".into(),
                    labor_cost: dec("40"),
                },
            )
            .unwrap();
        workflow.consume_part(store, &job.id, "P001", 1, "E002").unwrap();
        workflow.advance(store, &job.id, RepairStatus::InProgress, "E002").unwrap();
        workflow.advance(store, &job.id, RepairStatus::Completed, "E002").unwrap();
        job.id
    }

    #[test]
    fn invoice_bills_parts_labor_and_extras() {
        let billing = BillingService::new();
        let mut store = seeded_store();
        let job_id = completed_job(&mut store);

        let invoice = billing
            .generate_invoice(
                &mut store,
                GenerateInvoicePayload {
                    repair_id: job_id,
                    extra_items: vec![LineItem {
                        description: "Película".into(),
                        quantity: 2,
                        unit_price: dec("5.50"),
                        part_id: None,
                    }],
                },
            )
            .unwrap();

        assert_eq!(invoice.items.len(), 3);
        assert_eq!(invoice.items[0].unit_price, dec("249"));
        assert_eq!(invoice.items[1].description, "Labor");
        assert_eq!(invoice.total, dec("300.00"));
        assert_eq!(invoice.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn only_one_invoice_per_job_and_only_when_billable() {
        let billing = BillingService::new();
        let mut store = seeded_store();
        let job_id = completed_job(&mut store);

        billing
            .generate_invoice(&mut store, GenerateInvoicePayload { repair_id: job_id.clone(), extra_items: vec![] })
            .unwrap();
        let err = billing
            .generate_invoice(&mut store, GenerateInvoicePayload { repair_id: job_id, extra_items: vec![] })
            .unwrap_err();
        assert!(matches!(err, AppError::InvoiceAlreadyExists(_)));

        let workflow = RepairService::new(InventoryService::new(), true);
        let open = workflow
            .open_job(
                &mut store,
                OpenRepairPayload {
                    asset_id: None,
                    device_model: "Pixel 8".into(),
                    customer_name: "Bruno".into(),
                    customer_phone: None,
                    issue: "Bateria".into(),
                    labor_cost: Decimal::ZERO,
                },
            )
            .unwrap();
        let err = billing
            .generate_invoice(&mut store, GenerateInvoicePayload { repair_id: open.id, extra_items: vec![] })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(store.invoices().len(), 1);
    }

    #[test]
    fn payments_move_through_partial_to_paid() {
        let billing = BillingService::new();
        let mut store = seeded_store();
        let job_id = completed_job(&mut store);
        let invoice = billing
            .generate_invoice(&mut store, GenerateInvoicePayload { repair_id: job_id, extra_items: vec![] })
            .unwrap();
        assert_eq!(invoice.total, dec("289"));

        let partial = billing.record_payment(&mut store, &invoice.id, dec("100")).unwrap();
        assert_eq!(partial.payment_status, PaymentStatus::PartiallyPaid);
        assert_eq!(partial.balance(), dec("189"));

        let err = billing.record_payment(&mut store, &invoice.id, dec("0")).unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));

        let paid = billing.mark_paid(&mut store, &invoice.id).unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.amount_paid, dec("289"));

        let err = billing.record_payment(&mut store, &invoice.id, dec("1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(store.invoices().require(&invoice.id).unwrap().amount_paid, dec("289"));
    }

    #[test]
    fn invoice_leaves_history_only_after_paid() {
        let billing = BillingService::new();
        let workflow = RepairService::new(InventoryService::new(), true);
        let mut store = seeded_store();
        let admin = store.employees().require("E001").unwrap().clone();
        let job_id = completed_job(&mut store);
        let invoice = billing
            .generate_invoice(&mut store, GenerateInvoicePayload { repair_id: job_id.clone(), extra_items: vec![] })
            .unwrap();

        let err = billing.remove_invoice(&mut store, &invoice.id, &admin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        // O reparo faturado também fica preso à fatura
        let err = workflow.remove_job(&mut store, &job_id, &admin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialConflict);

        billing.mark_paid(&mut store, &invoice.id).unwrap();
        billing.remove_invoice(&mut store, &invoice.id, &admin).unwrap();
        assert!(store.invoices().is_empty());
    }

    #[test]
    fn overflowing_totals_are_refused_without_panicking() {
        let billing = BillingService::new();
        let mut store = seeded_store();
        let job_id = completed_job(&mut store);

        let err = billing
            .generate_invoice(
                &mut store,
                GenerateInvoicePayload {
                    repair_id: job_id.clone(),
                    extra_items: vec![LineItem {
                        description: "Lote".into(),
                        quantity: 10,
                        unit_price: Decimal::MAX,
                        part_id: None,
                    }],
                },
            )
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));
        assert!(store.invoices().is_empty());

        let invoice = billing
            .generate_invoice(&mut store, GenerateInvoicePayload { repair_id: job_id, extra_items: vec![] })
            .unwrap();
        billing.record_payment(&mut store, &invoice.id, dec("1")).unwrap();
        let err = billing.record_payment(&mut store, &invoice.id, Decimal::MAX).unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));
        assert_eq!(store.invoices().require(&invoice.id).unwrap().amount_paid, dec("1"));
    }

    #[test]
    fn negative_extra_price_is_refused() {
        let billing = BillingService::new();
        let mut store = seeded_store();
        let job_id = completed_job(&mut store);

        let err = billing
            .generate_invoice(
                &mut store,
                GenerateInvoicePayload {
                    repair_id: job_id,
                    extra_items: vec![LineItem {
                        description: "Desconto".into(),
                        quantity: 1,
                        unit_price: dec("-10"),
                        part_id: None,
                    }],
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.invoices().is_empty());
    }
}
