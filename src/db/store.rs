// src/db/store.rs

use serde::{Deserialize, Serialize};

use crate::{
    common::error::AppError,
    models::{
        asset::{Asset, AssetStatus, Assignment},
        billing::{Invoice, PaymentStatus},
        employee::Employee,
        inventory::{InventoryCategory, Part, Transaction, TransactionStatus},
        repair::RepairJob,
        settings::{Department, SiteConfig},
    },
};

/// Tudo que vive numa coleção do store tem um id textual.
pub trait Record: Clone {
    const ENTITY: &'static str;
    fn id(&self) -> &str;
}

// Coleção plana, chaveada por id, que preserva a ordem de inserção
// (o snapshot é serializado como lista de registros).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Record> Collection<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn require(&self, id: &str) -> Result<&T, AppError> {
        self.get(id).ok_or_else(|| AppError::not_found(T::ENTITY, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn require_mut(&mut self, id: &str) -> Result<&mut T, AppError> {
        self.items
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| AppError::not_found(T::ENTITY, id))
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Substitui se existir, insere se não. Devolve o registro anterior.
    pub(crate) fn upsert(&mut self, record: T) -> Option<T> {
        match self.items.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => Some(std::mem::replace(slot, record)),
            None => {
                self.items.push(record);
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<T> {
        let pos = self.items.iter().position(|r| r.id() == id)?;
        Some(self.items.remove(pos))
    }
}

/// Divergência entre o saldo gravado e o que as transações aprovadas explicam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDiscrepancy {
    pub part_id: String,
    pub recorded: u32,
    pub expected: u32,
}

// O store completo. Também é o documento de snapshot (ver db::persistence).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityStore {
    employees: Collection<Employee>,
    assets: Collection<Asset>,
    assignments: Collection<Assignment>,
    parts: Collection<Part>,
    repairs: Collection<RepairJob>,
    invoices: Collection<Invoice>,
    transactions: Collection<Transaction>,
    inventory_categories: Collection<InventoryCategory>,
    departments: Collection<Department>,
    #[serde(flatten)]
    site: SiteConfig,
}

impl EntityStore {
    // ---
    // Leitura
    // ---

    pub fn employees(&self) -> &Collection<Employee> {
        &self.employees
    }

    pub fn assets(&self) -> &Collection<Asset> {
        &self.assets
    }

    pub fn assignments(&self) -> &Collection<Assignment> {
        &self.assignments
    }

    pub fn parts(&self) -> &Collection<Part> {
        &self.parts
    }

    pub fn repairs(&self) -> &Collection<RepairJob> {
        &self.repairs
    }

    pub fn invoices(&self) -> &Collection<Invoice> {
        &self.invoices
    }

    pub fn transactions(&self) -> &Collection<Transaction> {
        &self.transactions
    }

    pub fn inventory_categories(&self) -> &Collection<InventoryCategory> {
        &self.inventory_categories
    }

    pub fn departments(&self) -> &Collection<Department> {
        &self.departments
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn find_employee_by_email(&self, email: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.email.eq_ignore_ascii_case(email))
    }

    pub fn open_assignment_for(&self, asset_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.asset_id == asset_id && a.is_open())
    }

    pub fn low_stock_parts(&self) -> Vec<&Part> {
        self.parts.iter().filter(|p| p.is_low_stock()).collect()
    }

    /// Recalcula o saldo de cada peça a partir das transações aprovadas,
    /// na ordem de aprovação e com o mesmo piso em zero do ledger.
    pub fn stock_discrepancies(&self) -> Vec<StockDiscrepancy> {
        let mut approved: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Approved)
            .collect();
        approved.sort_by_key(|t| t.resolved_at.unwrap_or(t.timestamp));

        self.parts
            .iter()
            .filter_map(|part| {
                let expected = approved
                    .iter()
                    .filter(|t| t.part_id == part.id)
                    .fold(0i64, |stock, t| (stock + t.signed_quantity()).max(0));
                let expected = u32::try_from(expected).unwrap_or(u32::MAX);
                (expected != part.stock).then(|| StockDiscrepancy {
                    part_id: part.id.clone(),
                    recorded: part.stock,
                    expected,
                })
            })
            .collect()
    }

    // ---
    // Escrita pública (cadastros)
    // ---

    /// Insere ou substitui um funcionário. O e-mail é único.
    pub fn upsert_employee(&mut self, employee: Employee) -> Result<(), AppError> {
        if let Some(other) = self.find_employee_by_email(&employee.email) {
            if other.id != employee.id {
                return Err(AppError::EmailAlreadyExists);
            }
        }
        self.require_department(&employee.department)?;
        self.employees.upsert(employee);
        Ok(())
    }

    /// Insere ou substitui um ativo. Assigned / In Repair só vêm do fluxo
    /// de atribuições e reparos, então o status gravado é mantido nesses casos.
    pub fn upsert_asset(&mut self, mut asset: Asset) -> Result<(), AppError> {
        let current = self.assets.get(&asset.id).map(|a| a.status);
        match (current, asset.status) {
            (Some(from @ (AssetStatus::Assigned | AssetStatus::InRepair)), to) if to != from => {
                return Err(AppError::InvalidStateTransition {
                    entity: Asset::ENTITY,
                    id: asset.id,
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            (Some(from), to @ (AssetStatus::Assigned | AssetStatus::InRepair)) if to != from => {
                return Err(AppError::InvalidStateTransition {
                    entity: Asset::ENTITY,
                    id: asset.id,
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            (None, AssetStatus::Assigned | AssetStatus::InRepair) => {
                asset.status = AssetStatus::Available;
            }
            _ => {}
        }
        self.assets.upsert(asset);
        Ok(())
    }

    /// Insere ou substitui uma peça. O saldo nunca é escrito por aqui:
    /// uma peça existente mantém o seu, uma nova começa em zero.
    pub fn upsert_part(&mut self, mut part: Part) -> Result<(), AppError> {
        self.require_category(&part.category)?;
        part.stock = self.parts.get(&part.id).map(|p| p.stock).unwrap_or(0);
        self.parts.upsert(part);
        Ok(())
    }

    /// Renomear uma categoria propaga o novo nome às peças.
    /// O nome é a chave usada pelas peças, então é único.
    pub fn upsert_category(&mut self, category: InventoryCategory) -> Result<(), AppError> {
        if self
            .inventory_categories
            .iter()
            .any(|c| c.id != category.id && c.name.eq_ignore_ascii_case(&category.name))
        {
            return Err(AppError::NameAlreadyExists {
                entity: InventoryCategory::ENTITY,
                name: category.name,
            });
        }
        if let Some(previous) = self.inventory_categories.upsert(category.clone()) {
            if previous.name != category.name {
                for part in self.parts.iter_mut().filter(|p| p.category == previous.name) {
                    part.category = category.name.clone();
                }
            }
        }
        Ok(())
    }

    /// Renomear um departamento propaga o novo nome aos funcionários.
    pub fn upsert_department(&mut self, department: Department) -> Result<(), AppError> {
        if self
            .departments
            .iter()
            .any(|d| d.id != department.id && d.name.eq_ignore_ascii_case(&department.name))
        {
            return Err(AppError::NameAlreadyExists {
                entity: Department::ENTITY,
                name: department.name,
            });
        }
        if let Some(previous) = self.departments.upsert(department.clone()) {
            if previous.name != department.name {
                for employee in self.employees.iter_mut().filter(|e| e.department == previous.name) {
                    employee.department = department.name.clone();
                }
            }
        }
        Ok(())
    }

    // ---
    // Remoção (política: bloqueia enquanto houver referência não-terminal)
    // ---

    pub fn remove_employee(&mut self, id: &str) -> Result<Employee, AppError> {
        self.employees.require(id)?;
        if let Some(a) = self.assignments.iter().find(|a| a.employee_id == id && a.is_open()) {
            return Err(referenced(Employee::ENTITY, id, format!("atribuição aberta {}", a.id)));
        }
        self.employees.remove(id).ok_or_else(|| AppError::not_found(Employee::ENTITY, id))
    }

    pub fn remove_asset(&mut self, id: &str) -> Result<Asset, AppError> {
        self.assets.require(id)?;
        if let Some(a) = self.open_assignment_for(id) {
            return Err(referenced(Asset::ENTITY, id, format!("atribuição aberta {}", a.id)));
        }
        if let Some(job) = self
            .repairs
            .iter()
            .find(|j| j.asset_id.as_deref() == Some(id) && !j.status.is_terminal())
        {
            return Err(referenced(Asset::ENTITY, id, format!("reparo em andamento {}", job.id)));
        }
        self.assets.remove(id).ok_or_else(|| AppError::not_found(Asset::ENTITY, id))
    }

    pub fn remove_part(&mut self, id: &str) -> Result<Part, AppError> {
        self.parts.require(id)?;
        if let Some(t) = self.transactions.iter().find(|t| t.part_id == id && t.is_pending()) {
            return Err(referenced(Part::ENTITY, id, format!("transação pendente {}", t.id)));
        }
        if let Some(job) = self.repairs.iter().find(|j| {
            !j.status.is_terminal() && j.parts_used.iter().any(|u| u.part_id == id)
        }) {
            return Err(referenced(Part::ENTITY, id, format!("reparo em andamento {}", job.id)));
        }
        self.parts.remove(id).ok_or_else(|| AppError::not_found(Part::ENTITY, id))
    }

    pub fn remove_category(&mut self, id: &str) -> Result<InventoryCategory, AppError> {
        let name = self.inventory_categories.require(id)?.name.clone();
        if let Some(part) = self.parts.iter().find(|p| p.category == name) {
            return Err(referenced(InventoryCategory::ENTITY, id, format!("peça {}", part.id)));
        }
        self.inventory_categories
            .remove(id)
            .ok_or_else(|| AppError::not_found(InventoryCategory::ENTITY, id))
    }

    pub fn remove_department(&mut self, id: &str) -> Result<Department, AppError> {
        let name = self.departments.require(id)?.name.clone();
        if let Some(e) = self.employees.iter().find(|e| e.department == name) {
            return Err(referenced(Department::ENTITY, id, format!("funcionário {}", e.id)));
        }
        self.departments
            .remove(id)
            .ok_or_else(|| AppError::not_found(Department::ENTITY, id))
    }

    // Registros de histórico: só saem depois de terminais.

    /// Aprovadas sustentam o saldo das peças, então só rejeitadas saem.
    pub fn remove_transaction(&mut self, id: &str) -> Result<Transaction, AppError> {
        let tx = self.transactions.require(id)?;
        if tx.status != TransactionStatus::Rejected {
            return Err(still_open(Transaction::ENTITY, id, &tx.status.to_string()));
        }
        self.transactions
            .remove(id)
            .ok_or_else(|| AppError::not_found(Transaction::ENTITY, id))
    }

    pub fn remove_assignment(&mut self, id: &str) -> Result<Assignment, AppError> {
        if self.assignments.require(id)?.is_open() {
            return Err(still_open(Assignment::ENTITY, id, "Open"));
        }
        self.assignments
            .remove(id)
            .ok_or_else(|| AppError::not_found(Assignment::ENTITY, id))
    }

    pub fn remove_repair(&mut self, id: &str) -> Result<RepairJob, AppError> {
        let job = self.repairs.require(id)?;
        if !job.status.is_terminal() {
            return Err(still_open(RepairJob::ENTITY, id, &job.status.to_string()));
        }
        if let Some(inv) = self.invoices.iter().find(|i| i.repair_id.as_deref() == Some(id)) {
            return Err(referenced(RepairJob::ENTITY, id, format!("fatura {}", inv.id)));
        }
        self.repairs.remove(id).ok_or_else(|| AppError::not_found(RepairJob::ENTITY, id))
    }

    pub fn remove_invoice(&mut self, id: &str) -> Result<Invoice, AppError> {
        let invoice = self.invoices.require(id)?;
        if invoice.payment_status != PaymentStatus::Paid {
            return Err(still_open(Invoice::ENTITY, id, &invoice.payment_status.to_string()));
        }
        self.invoices.remove(id).ok_or_else(|| AppError::not_found(Invoice::ENTITY, id))
    }

    // ---
    // Acesso interno para os serviços (mantém as invariantes)
    // ---

    pub(crate) fn employees_mut(&mut self) -> &mut Collection<Employee> {
        &mut self.employees
    }

    pub(crate) fn assets_mut(&mut self) -> &mut Collection<Asset> {
        &mut self.assets
    }

    pub(crate) fn assignments_mut(&mut self) -> &mut Collection<Assignment> {
        &mut self.assignments
    }

    pub(crate) fn parts_mut(&mut self) -> &mut Collection<Part> {
        &mut self.parts
    }

    pub(crate) fn repairs_mut(&mut self) -> &mut Collection<RepairJob> {
        &mut self.repairs
    }

    pub(crate) fn invoices_mut(&mut self) -> &mut Collection<Invoice> {
        &mut self.invoices
    }

    pub(crate) fn transactions_mut(&mut self) -> &mut Collection<Transaction> {
        &mut self.transactions
    }

    pub(crate) fn inventory_categories_mut(&mut self) -> &mut Collection<InventoryCategory> {
        &mut self.inventory_categories
    }

    pub(crate) fn departments_mut(&mut self) -> &mut Collection<Department> {
        &mut self.departments
    }

    pub(crate) fn set_site(&mut self, site: SiteConfig) {
        self.site = site;
    }

    pub(crate) fn require_department(&self, name: &str) -> Result<&Department, AppError> {
        self.departments
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AppError::not_found(Department::ENTITY, name))
    }

    pub(crate) fn require_category(&self, name: &str) -> Result<&InventoryCategory, AppError> {
        self.inventory_categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| AppError::not_found(InventoryCategory::ENTITY, name))
    }
}

fn referenced(entity: &'static str, id: &str, referenced_by: String) -> AppError {
    AppError::ReferentialConflict {
        entity,
        id: id.to_string(),
        referenced_by,
    }
}

fn still_open(entity: &'static str, id: &str, status: &str) -> AppError {
    AppError::InvalidStateTransition {
        entity,
        id: id.to_string(),
        from: status.to_string(),
        to: "Removed".to_string(),
    }
}
