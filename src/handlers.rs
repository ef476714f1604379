pub mod assets;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod employees;
pub mod inventory;
pub mod repairs;
pub mod settings;
