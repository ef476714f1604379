// src/services/staff_service.rs

use validator::Validate;

use crate::{
    common::error::AppError,
    db::{EntityStore, Record},
    models::employee::{Employee, EmployeeStatus, Permissions, Role, UpdateProfilePayload},
    services::access_policy::{ensure_can, Action},
};

/// Administração da equipe. Tudo aqui exige `canManageUsers`.
#[derive(Clone, Default)]
pub struct StaffService;

impl StaffService {
    pub fn new() -> Self {
        Self
    }

    pub fn list(&self, store: &EntityStore) -> Vec<Employee> {
        store.employees().list().to_vec()
    }

    /// Pending -> Active
    pub fn approve_employee(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        employee_id: &str,
    ) -> Result<Employee, AppError> {
        ensure_can(actor, Action::ManageUsers)?;
        let employee = store.employees_mut().require_mut(employee_id)?;
        if employee.status != EmployeeStatus::Pending {
            return Err(AppError::InvalidStateTransition {
                entity: Employee::ENTITY,
                id: employee_id.to_string(),
                from: format!("{:?}", employee.status),
                to: format!("{:?}", EmployeeStatus::Active),
            });
        }
        employee.status = EmployeeStatus::Active;

        tracing::info!(employee_id, actor = %actor.id, "funcionário aprovado");
        Ok(employee.clone())
    }

    /// Volta o funcionário para Pending (perde as ações de registro).
    pub fn deactivate(&self, store: &mut EntityStore, actor: &Employee, employee_id: &str) -> Result<Employee, AppError> {
        ensure_can(actor, Action::ManageUsers)?;
        let employee = store.employees_mut().require_mut(employee_id)?;
        if employee.status == EmployeeStatus::Pending {
            return Err(AppError::InvalidStateTransition {
                entity: Employee::ENTITY,
                id: employee_id.to_string(),
                from: format!("{:?}", EmployeeStatus::Pending),
                to: format!("{:?}", EmployeeStatus::Pending),
            });
        }
        employee.status = EmployeeStatus::Pending;

        tracing::info!(employee_id, actor = %actor.id, "funcionário desativado");
        Ok(employee.clone())
    }

    pub fn set_role(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        employee_id: &str,
        role: Role,
    ) -> Result<Employee, AppError> {
        ensure_can(actor, Action::ManageUsers)?;
        let employee = store.employees_mut().require_mut(employee_id)?;
        let previous = employee.role;
        employee.role = role;

        tracing::info!(employee_id, ?previous, ?role, actor = %actor.id, "cargo alterado");
        Ok(employee.clone())
    }

    pub fn set_permissions(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        employee_id: &str,
        permissions: Permissions,
    ) -> Result<Employee, AppError> {
        ensure_can(actor, Action::ManageUsers)?;
        let employee = store.employees_mut().require_mut(employee_id)?;
        employee.permissions = permissions;

        tracing::info!(employee_id, ?permissions, actor = %actor.id, "permissões alteradas");
        Ok(employee.clone())
    }

    pub fn update_profile(
        &self,
        store: &mut EntityStore,
        actor: &Employee,
        employee_id: &str,
        payload: UpdateProfilePayload,
    ) -> Result<Employee, AppError> {
        ensure_can(actor, Action::ManageUsers)?;
        payload.validate()?;

        let mut employee = store.employees().require(employee_id)?.clone();
        if let Some(name) = payload.name {
            employee.name = name;
        }
        if let Some(department) = payload.department {
            employee.department = department;
        }
        // Checa o departamento (e o e-mail) antes de gravar
        store.upsert_employee(employee.clone())?;
        Ok(employee)
    }

    pub fn remove(&self, store: &mut EntityStore, actor: &Employee, employee_id: &str) -> Result<Employee, AppError> {
        ensure_can(actor, Action::ManageUsers)?;
        ensure_can(actor, Action::Delete)?;
        let removed = store.remove_employee(employee_id)?;
        tracing::info!(employee_id, actor = %actor.id, "funcionário removido");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;
    use crate::db::seed::seeded_store;
    use crate::services::access_policy::can_mutate;

    fn pending_newcomer(store: &mut EntityStore) -> Employee {
        let mut newcomer = store.employees().require("E002").unwrap().clone();
        newcomer.id = "E100".into();
        newcomer.email = "novo@company.com".into();
        newcomer.role = Role::Staff;
        newcomer.status = EmployeeStatus::Pending;
        newcomer.permissions = Permissions::default();
        store.upsert_employee(newcomer.clone()).unwrap();
        newcomer
    }

    #[test]
    fn admin_approves_and_deactivates() {
        let staff = StaffService::new();
        let mut store = seeded_store();
        let admin = store.employees().require("E001").unwrap().clone();
        pending_newcomer(&mut store);

        let approved = staff.approve_employee(&mut store, &admin, "E100").unwrap();
        assert_eq!(approved.status, EmployeeStatus::Active);

        let err = staff.approve_employee(&mut store, &admin, "E100").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        let back = staff.deactivate(&mut store, &admin, "E100").unwrap();
        assert_eq!(back.status, EmployeeStatus::Pending);
        assert!(!can_mutate(&back, Action::Export));
    }

    #[test]
    fn manager_without_flag_cannot_manage_users() {
        let staff = StaffService::new();
        let mut store = seeded_store();
        let manager = store.employees().require("E002").unwrap().clone();
        pending_newcomer(&mut store);

        let err = staff.set_role(&mut store, &manager, "E100", Role::Admin).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(store.employees().require("E100").unwrap().role, Role::Staff);
    }

    #[test]
    fn permissions_and_role_are_independent() {
        let staff = StaffService::new();
        let mut store = seeded_store();
        let admin = store.employees().require("E001").unwrap().clone();

        let updated = staff
            .set_permissions(&mut store, &admin, "E002", Permissions { can_delete: true, ..Permissions::default() })
            .unwrap();
        assert_eq!(updated.role, Role::Manager);
        assert!(updated.permissions.can_delete);
        assert!(!updated.permissions.can_export);
    }

    #[test]
    fn profile_update_requires_existing_department() {
        let staff = StaffService::new();
        let mut store = seeded_store();
        let admin = store.employees().require("E001").unwrap().clone();

        let err = staff
            .update_profile(
                &mut store,
                &admin,
                "E002",
                UpdateProfilePayload { name: None, department: Some("Marketing".into()) },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.employees().require("E002").unwrap().department, "Operations");

        let moved = staff
            .update_profile(
                &mut store,
                &admin,
                "E002",
                UpdateProfilePayload { name: Some("John M.".into()), department: Some("Finance".into()) },
            )
            .unwrap();
        assert_eq!(moved.name, "John M.");
        assert_eq!(store.employees().require("E002").unwrap().department, "Finance");
    }
}
