// src/services/access_policy.rs
//
// Único ponto que decide o que cada cargo vê e o que cada funcionário pode alterar.
// Funções puras: nenhuma consulta ao store, nenhum efeito colateral.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::{
    common::error::AppError,
    models::employee::{Employee, Role},
};

/// Abas / áreas funcionais da aplicação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Dashboard,
    Assets,
    Assignments,
    Inventory,
    Billing,
    Repairs,
    Reports,
    Employees,
    Settings,
}

impl Feature {
    pub const ALL: [Feature; 9] = [
        Feature::Dashboard,
        Feature::Assets,
        Feature::Assignments,
        Feature::Inventory,
        Feature::Billing,
        Feature::Repairs,
        Feature::Reports,
        Feature::Employees,
        Feature::Settings,
    ];

    /// Cargo mínimo da aba
    pub fn min_role(self) -> Role {
        match self {
            Feature::Dashboard | Feature::Inventory | Feature::Billing | Feature::Repairs => Role::Staff,
            Feature::Assets | Feature::Assignments | Feature::Reports | Feature::Employees => Role::Manager,
            Feature::Settings => Role::Admin,
        }
    }
}

/// Ações de registro que não se resolvem só pela aba.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Delete,
    Export,
    ManageUsers,
    ApproveTransaction,
    ConfigureSite,
}

pub fn permitted_tabs(role: Role) -> BTreeSet<Feature> {
    Feature::ALL
        .into_iter()
        .filter(|f| can_access(role, *f))
        .collect()
}

// Admin vê tudo; Manager tudo menos o que é só de Admin; Staff só o nível Staff.
pub fn can_access(role: Role, feature: Feature) -> bool {
    match role {
        Role::Admin => true,
        Role::Manager => feature.min_role() != Role::Admin,
        Role::Staff => feature.min_role() == Role::Staff,
    }
}

/// As flags do funcionário mandam nas ações de registro; o cargo só nas de nível.
/// Funcionário Pending não executa nenhuma delas.
pub fn can_mutate(employee: &Employee, action: Action) -> bool {
    if !employee.is_active() {
        return false;
    }
    let p = &employee.permissions;
    match action {
        Action::Delete => p.can_delete,
        Action::Export => p.can_export,
        Action::ManageUsers => p.can_manage_users,
        Action::ApproveTransaction => employee.role >= Role::Manager,
        Action::ConfigureSite => employee.role == Role::Admin,
    }
}

pub fn ensure_access(employee: &Employee, feature: Feature) -> Result<(), AppError> {
    if can_access(employee.role, feature) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "o cargo {:?} não tem acesso a {:?}",
            employee.role, feature
        )))
    }
}

pub fn ensure_can(employee: &Employee, action: Action) -> Result<(), AppError> {
    if can_mutate(employee, action) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} não tem permissão para {:?}",
            employee.name, action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::seeded_store;
    use crate::models::employee::{EmployeeStatus, Permissions};

    #[test]
    fn admin_sees_every_tab() {
        assert_eq!(permitted_tabs(Role::Admin).len(), Feature::ALL.len());
    }

    #[test]
    fn manager_sees_everything_but_settings() {
        let tabs = permitted_tabs(Role::Manager);
        assert!(!tabs.contains(&Feature::Settings));
        assert_eq!(tabs.len(), Feature::ALL.len() - 1);
    }

    #[test]
    fn staff_sees_only_staff_tier() {
        let tabs: Vec<_> = permitted_tabs(Role::Staff).into_iter().collect();
        assert_eq!(
            tabs,
            vec![Feature::Dashboard, Feature::Inventory, Feature::Billing, Feature::Repairs]
        );
    }

    #[test]
    fn record_actions_follow_flags_not_role() {
        let store = seeded_store();
        let manager = store.employees().require("E002").unwrap().clone();

        assert!(!can_mutate(&manager, Action::Delete));
        assert!(can_mutate(&manager, Action::Export));
        assert!(can_mutate(&manager, Action::ApproveTransaction));
        assert!(!can_mutate(&manager, Action::ConfigureSite));

        // Um Staff com canDelete explícito pode apagar
        let mut staff = manager.clone();
        staff.role = Role::Staff;
        staff.permissions = Permissions { can_delete: true, ..Permissions::default() };
        assert!(can_mutate(&staff, Action::Delete));
        assert!(!can_mutate(&staff, Action::ApproveTransaction));
    }

    #[test]
    fn pending_employees_cannot_mutate() {
        let store = seeded_store();
        let mut admin = store.employees().require("E001").unwrap().clone();
        admin.status = EmployeeStatus::Pending;
        assert!(!can_mutate(&admin, Action::Delete));
        assert!(ensure_can(&admin, Action::ConfigureSite).is_err());
    }
}
