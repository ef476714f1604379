// src/models/employee.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::store::Record;

// Ordem de declaração = ordem de privilégio (Staff < Manager < Admin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Staff,
    Manager,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeStatus {
    Active,
    Pending,
}

/// Flags finas por funcionário, independentes do cargo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_delete: bool,
    pub can_export: bool,
    #[serde(rename = "canAccessAI")]
    pub can_access_ai: bool,
    pub can_manage_users: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            can_delete: true,
            can_export: true,
            can_access_ai: true,
            can_manage_users: true,
        }
    }
}

// Representa um funcionário como fica guardado no snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub staff_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub status: EmployeeStatus,
    #[serde(default)]
    pub permissions: Permissions,
    // Placeholder em texto puro (ou hash bcrypt, conforme o verificador configurado).
    // Nunca sai nas respostas HTTP: use `EmployeeProfile`.
    pub password: String,
    #[serde(default)]
    pub join_date: Option<NaiveDate>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

impl Record for Employee {
    const ENTITY: &'static str = "Employee";

    fn id(&self) -> &str {
        &self.id
    }
}

/// O que sai nas respostas: o funcionário sem a credencial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub id: String,
    pub staff_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub status: EmployeeStatus,
    pub permissions: Permissions,
    pub join_date: Option<NaiveDate>,
}

impl From<&Employee> for EmployeeProfile {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id.clone(),
            staff_id: e.staff_id.clone(),
            name: e.name.clone(),
            email: e.email.clone(),
            department: e.department.clone(),
            role: e.role,
            status: e.status,
            permissions: e.permissions,
            join_date: e.join_date,
        }
    }
}

// --- Payloads de administração da equipe ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRolePayload {
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "O departamento é obrigatório."))]
    pub department: Option<String>,
}
