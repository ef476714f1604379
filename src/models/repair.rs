// src/models/repair.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::db::store::Record;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairStatus {
    Received,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Delivered,
    Cancelled,
}

impl RepairStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RepairStatus::Delivered | RepairStatus::Cancelled)
    }

    /// Próxima etapa da progressão linear (Cancelled fica fora dela).
    pub fn next(self) -> Option<RepairStatus> {
        match self {
            RepairStatus::Received => Some(RepairStatus::InProgress),
            RepairStatus::InProgress => Some(RepairStatus::Completed),
            RepairStatus::Completed => Some(RepairStatus::Delivered),
            RepairStatus::Delivered | RepairStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(self, to: RepairStatus) -> bool {
        if to == RepairStatus::Cancelled {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }

    /// Etapas em que ainda se consome peças.
    pub fn accepts_parts(self) -> bool {
        matches!(self, RepairStatus::Received | RepairStatus::InProgress)
    }

    /// Etapas a partir das quais o reparo pode ser faturado.
    pub fn is_billable(self) -> bool {
        matches!(self, RepairStatus::Completed | RepairStatus::Delivered)
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepairStatus::Received => "Received",
            RepairStatus::InProgress => "In Progress",
            RepairStatus::Completed => "Completed",
            RepairStatus::Delivered => "Delivered",
            RepairStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

// Peça consumida, com a transação de estoque que ela gerou
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUsage {
    pub part_id: String,
    pub quantity: u32,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairJob {
    pub id: String,
    // Ativo interno, quando o aparelho é da empresa
    #[serde(default)]
    pub asset_id: Option<String>,
    pub device_model: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub issue: String,
    pub status: RepairStatus,
    #[serde(default)]
    pub parts_used: Vec<PartUsage>,
    #[serde(default)]
    pub labor_cost: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Record for RepairJob {
    const ENTITY: &'static str = "RepairJob";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenRepairPayload {
    pub asset_id: Option<String>,
    #[validate(length(min = 1, message = "O modelo do aparelho é obrigatório."))]
    pub device_model: String,
    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, message = "A descrição do defeito é obrigatória."))]
    pub issue: String,
    #[serde(default)]
    pub labor_cost: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRepairPayload {
    pub status: RepairStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumePartPayload {
    pub part_id: String,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_is_linear_and_cancel_only_from_open_states() {
        use RepairStatus::*;
        assert!(Received.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Delivered));
        assert!(!Received.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(Completed.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }
}
