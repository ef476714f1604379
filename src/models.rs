pub mod asset;
pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod employee;
pub mod inventory;
pub mod repair;
pub mod settings;
