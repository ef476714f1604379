// src/models/asset.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::db::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Available,
    Assigned,
    #[serde(rename = "In Repair")]
    InRepair,
    Retired,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetStatus::Available => "Available",
            AssetStatus::Assigned => "Assigned",
            AssetStatus::InRepair => "In Repair",
            AssetStatus::Retired => "Retired",
        };
        f.write_str(s)
    }
}

// --- Ativo (hardware da empresa) ---
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub tag: String,
    pub serial_number: String,
    pub model: String,
    pub category: String,
    #[serde(default)]
    pub specs: String,
    pub status: AssetStatus,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_expiry: Option<NaiveDate>,
}

impl Record for Asset {
    const ENTITY: &'static str = "Asset";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- Atribuição (checkout de um ativo para um funcionário) ---
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub asset_id: String,
    pub employee_id: String,
    pub checkout_date: DateTime<Utc>,
    // None enquanto a atribuição estiver aberta
    pub return_date: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

impl Record for Assignment {
    const ENTITY: &'static str = "Assignment";

    fn id(&self) -> &str {
        &self.id
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertAssetPayload {
    /// Ausente = novo ativo
    pub id: Option<String>,
    #[validate(length(min = 1, message = "A tag é obrigatória."))]
    pub tag: String,
    #[validate(length(min = 1, message = "O número de série é obrigatório."))]
    pub serial_number: String,
    #[validate(length(min = 1, message = "O modelo é obrigatório."))]
    pub model: String,
    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    pub category: String,
    #[serde(default)]
    pub specs: String,
    /// Só Available/Retired são aceitos por aqui; os demais vêm do fluxo.
    pub status: Option<AssetStatus>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[validate(length(min = 1, message = "O campo 'assetId' é obrigatório."))]
    pub asset_id: String,
    #[validate(length(min = 1, message = "O campo 'employeeId' é obrigatório."))]
    pub employee_id: String,
}
