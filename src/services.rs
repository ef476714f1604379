pub mod access_policy;
pub mod auth;
pub use auth::AuthService;
pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod assignment_service;
pub use assignment_service::AssignmentService;
pub mod repair_service;
pub use repair_service::RepairService;
pub mod billing_service;
pub use billing_service::BillingService;
pub mod staff_service;
pub use staff_service::StaffService;
pub mod settings_service;
pub use settings_service::SettingsService;
pub mod dashboard_service;
pub use dashboard_service::DashboardService;
