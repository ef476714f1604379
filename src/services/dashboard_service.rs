// src/services/dashboard_service.rs

use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::EntityStore,
    models::{
        asset::AssetStatus,
        billing::Invoice,
        dashboard::{DashboardSummary, ReportSummary, StatusCount},
        employee::Employee,
        repair::RepairStatus,
    },
    services::access_policy::{ensure_can, Action},
};

#[derive(Clone, Default)]
pub struct DashboardService;

impl DashboardService {
    pub fn new() -> Self {
        Self
    }

    pub fn get_summary(&self, store: &EntityStore) -> DashboardSummary {
        let count_assets = |status: AssetStatus| store.assets().iter().filter(|a| a.status == status).count();

        DashboardSummary {
            total_assets: store.assets().len(),
            available_assets: count_assets(AssetStatus::Available),
            assigned_assets: count_assets(AssetStatus::Assigned),
            open_assignments: store.assignments().iter().filter(|a| a.is_open()).count(),
            active_employees: store.employees().iter().filter(|e| e.is_active()).count(),
            open_repairs: store.repairs().iter().filter(|j| !j.status.is_terminal()).count(),
            low_stock: store.low_stock_parts().into_iter().cloned().collect(),
            pending_transactions: store
                .transactions()
                .iter()
                .filter(|t| t.is_pending())
                .cloned()
                .collect(),
        }
    }

    pub fn get_report(&self, store: &EntityStore) -> ReportSummary {
        let (cost, sale) = store.parts().iter().fold((Decimal::ZERO, Decimal::ZERO), |(c, s), p| {
            let qty = Decimal::from(p.stock);
            (
                c.saturating_add(qty.saturating_mul(p.cost_price)),
                s.saturating_add(qty.saturating_mul(p.sale_price)),
            )
        });

        // Relatório não falha: somas saturam no limite do Decimal
        let sum = |f: fn(&Invoice) -> Decimal| {
            store
                .invoices()
                .iter()
                .fold(Decimal::ZERO, |acc, i| acc.saturating_add(f(i)))
        };
        let invoiced = sum(|i| i.total);
        let collected = sum(|i| i.amount_paid.min(i.total));
        let outstanding = sum(Invoice::balance);

        let repairs_by_status = [
            RepairStatus::Received,
            RepairStatus::InProgress,
            RepairStatus::Completed,
            RepairStatus::Delivered,
            RepairStatus::Cancelled,
        ]
        .into_iter()
        .map(|status| StatusCount {
            status: status.to_string(),
            count: store.repairs().iter().filter(|j| j.status == status).count(),
        })
        .collect();

        let site = store.site();
        ReportSummary {
            inventory_cost_value: cost,
            inventory_sale_value: sale,
            invoiced_total: invoiced,
            collected_total: collected,
            outstanding_total: outstanding,
            formatted_outstanding: site.format_amount(outstanding),
            formatted_collected: site.format_amount(collected),
            repairs_by_status,
        }
    }

    /// Mesmo relatório, para download. Exige a flag de exportação.
    pub fn export_report(&self, store: &EntityStore, actor: &Employee) -> Result<ReportSummary, AppError> {
        ensure_can(actor, Action::Export)?;
        Ok(self.get_report(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::seed::seeded_store;

    #[test]
    fn seeded_summary_flags_p002_as_low_stock() {
        let summary = DashboardService::new().get_summary(&seeded_store());
        assert_eq!(summary.total_assets, 2);
        assert_eq!(summary.available_assets, 2);
        assert_eq!(summary.active_employees, 2);
        assert_eq!(summary.open_repairs, 0);
        let low: Vec<_> = summary.low_stock.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(low, vec!["P002"]);
        assert!(summary.pending_transactions.is_empty());
    }

    #[test]
    fn report_values_inventory_at_cost_and_sale() {
        let report = DashboardService::new().get_report(&seeded_store());
        // 12 x 150 + 3 x 80 / 12 x 249 + 3 x 129
        assert_eq!(report.inventory_cost_value, Decimal::from(2040));
        assert_eq!(report.inventory_sale_value, Decimal::from(3375));
        assert_eq!(report.formatted_outstanding, "$0.00");
        assert_eq!(report.repairs_by_status.len(), 5);
    }

    #[test]
    fn export_needs_the_export_flag() {
        let store = seeded_store();
        let service = DashboardService::new();
        let mut manager = store.employees().require("E002").unwrap().clone();

        let report = service.export_report(&store, &manager).unwrap();
        assert_eq!(report.inventory_cost_value, Decimal::from(2040));

        manager.permissions.can_export = false;
        let err = service.export_report(&store, &manager).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn huge_prices_saturate_instead_of_panicking() {
        let mut store = seeded_store();
        let mut part = store.parts().require("P001").unwrap().clone();
        part.cost_price = Decimal::MAX;
        part.sale_price = Decimal::MAX;
        store.upsert_part(part).unwrap();

        let report = DashboardService::new().get_report(&store);
        assert_eq!(report.inventory_cost_value, Decimal::MAX);
        assert_eq!(report.inventory_sale_value, Decimal::MAX);
    }
}
