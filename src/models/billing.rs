// src/models/billing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::db::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::Paid => "Paid",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,
    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub part_id: Option<String>,
}

impl LineItem {
    /// `None` quando o produto estoura o limite do `Decimal`.
    pub fn subtotal(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub repair_id: Option<String>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub total: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    /// Quanto falta pagar
    pub fn balance(&self) -> Decimal {
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }
}

impl Record for Invoice {
    const ENTITY: &'static str = "Invoice";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInvoicePayload {
    pub repair_id: String,
    #[serde(default)]
    #[validate(nested)]
    pub extra_items: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub amount: Decimal,
}
