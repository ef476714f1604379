// src/db/seed.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    common::ids::SYSTEM_ACTOR,
    db::store::{Collection, EntityStore},
    models::{
        asset::{Asset, AssetStatus},
        employee::{Employee, EmployeeStatus, Permissions, Role},
        inventory::{InventoryCategory, Part, Transaction, TransactionKind, TransactionStatus},
        settings::{Department, SiteConfig},
    },
};

/// Dados iniciais usados quando não há snapshot salvo (primeira execução).
pub fn seeded_store() -> EntityStore {
    let mut store = EntityStore::default();
    store.set_site(SiteConfig::default());

    *store.departments_mut() = Collection::from(
        [
            ("dept-1", "IT"),
            ("dept-2", "Operations"),
            ("dept-3", "Finance"),
            ("dept-4", "Support"),
        ]
        .into_iter()
        .map(|(id, name)| Department { id: id.into(), name: name.into() })
        .collect::<Vec<_>>(),
    );

    *store.inventory_categories_mut() = Collection::from(
        [("cat-1", "Screen"), ("cat-2", "Battery"), ("cat-3", "Charging Port")]
            .into_iter()
            .map(|(id, name)| InventoryCategory { id: id.into(), name: name.into(), is_visible: true })
            .collect::<Vec<_>>(),
    );

    *store.employees_mut() = Collection::from(vec![
        Employee {
            id: "E001".into(),
            staff_id: "MF-001".into(),
            name: "Sarah Admin".into(),
            email: "admin@company.com".into(),
            department: "IT".into(),
            role: Role::Admin,
            status: EmployeeStatus::Active,
            permissions: Permissions::all(),
            password: "password".into(),
            join_date: None,
        },
        Employee {
            id: "E002".into(),
            staff_id: "MF-002".into(),
            name: "John Manager".into(),
            email: "manager@company.com".into(),
            department: "Operations".into(),
            role: Role::Manager,
            status: EmployeeStatus::Active,
            permissions: Permissions {
                can_delete: false,
                can_export: true,
                can_access_ai: true,
                can_manage_users: false,
            },
            password: "password".into(),
            join_date: None,
        },
    ]);

    *store.assets_mut() = Collection::from(vec![
        Asset {
            id: "ASSET-1".into(),
            tag: "TAG-001".into(),
            serial_number: "SN992831".into(),
            model: "iPhone 15 Pro Max".into(),
            category: "Mobile".into(),
            specs: "256GB, Titanium".into(),
            status: AssetStatus::Available,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            warranty_expiry: NaiveDate::from_ymd_opt(2025, 1, 10),
        },
        Asset {
            id: "ASSET-2".into(),
            tag: "TAG-002".into(),
            serial_number: "SN992832".into(),
            model: "Samsung Galaxy S24 Ultra".into(),
            category: "Mobile".into(),
            specs: "512GB, Black".into(),
            status: AssetStatus::Available,
            purchase_date: NaiveDate::from_ymd_opt(2024, 2, 15),
            warranty_expiry: NaiveDate::from_ymd_opt(2025, 2, 15),
        },
    ]);

    let parts = [
        ("P001", "iPhone 15 Pro Screen", "iFixIt Global", "Screen", 12, 5, 249, 150),
        ("P002", "MacBook M2 Battery", "TechParts Co", "Battery", 3, 5, 129, 80),
    ];

    // O saldo de abertura entra como transação aprovada,
    // assim o saldo sempre bate com o histórico.
    let now = Utc::now();
    for (id, name, supplier, category, stock, min, sale, cost) in parts {
        store.parts_mut().upsert(Part {
            id: id.into(),
            name: name.into(),
            supplier: supplier.into(),
            category: category.into(),
            stock,
            min_stock_level: min,
            sale_price: Decimal::from(sale),
            cost_price: Decimal::from(cost),
        });
        store.transactions_mut().upsert(Transaction {
            id: format!("TX-OPEN-{id}"),
            part_id: id.into(),
            quantity: stock,
            kind: TransactionKind::StockIntake,
            status: TransactionStatus::Approved,
            requested_by: SYSTEM_ACTOR.into(),
            approved_by: Some(SYSTEM_ACTOR.into()),
            timestamp: now,
            resolved_at: Some(now),
            repair_id: None,
            note: Some("Estoque de abertura".into()),
        });
    }

    store
}
