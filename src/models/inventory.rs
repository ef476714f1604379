// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::db::store::Record;

// --- 1. Categorias ---
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCategory {
    pub id: String,
    pub name: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Record for InventoryCategory {
    const ENTITY: &'static str = "InventoryCategory";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- 2. Peças (catálogo + saldo) ---
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub name: String,
    pub supplier: String,
    // Nome da categoria (chave lógica, não id)
    pub category: String,
    // Só muda pela aprovação de transações. Nunca negativo.
    pub stock: u32,
    pub min_stock_level: u32,
    pub sale_price: Decimal,
    pub cost_price: Decimal,
}

impl Part {
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock_level
    }

    /// Aplica um delta com piso em zero e devolve o novo saldo.
    pub(crate) fn apply_delta(&mut self, delta: i64) -> u32 {
        let next = (i64::from(self.stock) + delta).max(0);
        self.stock = u32::try_from(next).unwrap_or(u32::MAX);
        self.stock
    }
}

impl Record for Part {
    const ENTITY: &'static str = "Part";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- 3. Transações de estoque ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "Stock Intake")]
    StockIntake,
    #[serde(rename = "Stock Usage", alias = "Stock Consumption")]
    StockUsage,
    Adjustment,
}

impl TransactionKind {
    /// Entrada soma; qualquer outro tipo baixa o saldo.
    pub fn signed_delta(self, quantity: u32) -> i64 {
        match self {
            TransactionKind::StockIntake => i64::from(quantity),
            TransactionKind::StockUsage | TransactionKind::Adjustment => -i64::from(quantity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub part_id: String,
    pub quantity: u32,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub requested_by: String,
    #[serde(default)]
    pub approved_by: Option<String>,
    pub timestamp: DateTime<Utc>,
    // Quando foi aprovada/rejeitada
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    // Reparo que originou o consumo, se houver
    #[serde(default)]
    pub repair_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    pub fn signed_quantity(&self) -> i64 {
        self.kind.signed_delta(self.quantity)
    }
}

impl Record for Transaction {
    const ENTITY: &'static str = "Transaction";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- Payloads ---

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPartPayload {
    /// Ausente = nova peça
    pub id: Option<String>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub supplier: String,
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,
    #[serde(default)]
    pub min_stock_level: u32,
    #[validate(custom(function = "validate_not_negative"))]
    pub sale_price: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Decimal,
    /// Estoque de abertura de uma peça nova (vira uma entrada aprovada).
    #[serde(default)]
    pub initial_stock: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTransactionPayload {
    pub part_id: String,
    // i64 para que zero/negativo cheguem ao ledger e virem InvalidQuantity
    pub quantity: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub part_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCategoryPayload {
    pub id: Option<String>,
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}
