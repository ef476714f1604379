// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::inventory::{Part, Transaction};

// 1. Resumo (os cards do topo)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_assets: usize,
    pub available_assets: usize,
    pub assigned_assets: usize,
    pub open_assignments: usize,
    pub active_employees: usize,
    pub open_repairs: usize,
    pub low_stock: Vec<Part>,
    pub pending_transactions: Vec<Transaction>,
}

// 2. Relatórios (aba de Manager)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub inventory_cost_value: Decimal,
    pub inventory_sale_value: Decimal,
    pub invoiced_total: Decimal,
    pub collected_total: Decimal,
    pub outstanding_total: Decimal,
    // Versões formatadas com o símbolo da moeda do site
    pub formatted_outstanding: String,
    pub formatted_collected: String,
    pub repairs_by_status: Vec<StatusCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}
