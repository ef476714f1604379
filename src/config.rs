// src/config.rs

use anyhow::{bail, Context};
use std::{env, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::{seed::seeded_store, EntityStore, JsonFileStore, Persister, PgSnapshotStore, SnapshotStore},
    services::{
        auth::{upgrade_stored_passwords, BcryptVerifier, CredentialVerifier, PlaintextVerifier},
        AssignmentService, AuthService, BillingService, DashboardService, InventoryService,
        RepairService, SettingsService, StaffService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    Plaintext,
    Bcrypt,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    // Com DATABASE_URL o snapshot vai para o Postgres; sem, para o arquivo JSON
    pub database_url: Option<String>,
    pub snapshot_path: PathBuf,
    pub repair_auto_approve: bool,
    pub allow_universal_secret: bool,
    pub password_scheme: PasswordScheme,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            snapshot_path: PathBuf::from("mobifix_db.json"),
            repair_auto_approve: true,
            allow_universal_secret: true,
            password_scheme: PasswordScheme::Plaintext,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let password_scheme = match lookup("PASSWORD_SCHEME").as_deref().map(str::trim) {
            None | Some("") | Some("plaintext") => PasswordScheme::Plaintext,
            Some("bcrypt") => PasswordScheme::Bcrypt,
            Some(other) => bail!("PASSWORD_SCHEME inválido: '{}' (use plaintext ou bcrypt)", other),
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            snapshot_path: lookup("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            repair_auto_approve: parse_flag("REPAIR_AUTO_APPROVE", lookup("REPAIR_AUTO_APPROVE"), true)?,
            allow_universal_secret: parse_flag("ALLOW_UNIVERSAL_SECRET", lookup("ALLOW_UNIVERSAL_SECRET"), true)?,
            password_scheme,
            bcrypt_cost: match lookup("BCRYPT_COST").filter(|v| !v.trim().is_empty()) {
                None => defaults.bcrypt_cost,
                Some(v) => {
                    let cost: u32 = v.trim().parse().with_context(|| format!("BCRYPT_COST inválido: '{}'", v))?;
                    if !(4..=31).contains(&cost) {
                        bail!("BCRYPT_COST deve ficar entre 4 e 31, recebido {}", cost);
                    }
                    cost
                }
            },
        })
    }
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> anyhow::Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} deve ser true ou false, recebido '{}'", name, other),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<EntityStore>>,
    persister: Persister,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub assignment_service: AssignmentService,
    pub repair_service: RepairService,
    pub billing_service: BillingService,
    pub staff_service: StaffService,
    pub settings_service: SettingsService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let snapshots: Arc<dyn SnapshotStore> = match &config.database_url {
            Some(url) => Arc::new(
                PgSnapshotStore::connect(url)
                    .await
                    .context("Falha ao conectar o armazenamento de snapshots no Postgres")?,
            ),
            None => {
                tracing::info!("📄 Snapshot em arquivo: {}", config.snapshot_path.display());
                Arc::new(JsonFileStore::new(&config.snapshot_path))
            }
        };

        Ok(Self::from_store(config, snapshots).await)
    }

    /// Carrega o snapshot (ou a semente) e monta o gráfico de dependências.
    ///
    /// Snapshot que não carrega nunca é sobrescrito: vai para a quarentena
    /// e a semente assume; se nem isso der, o estado roda sem gravar.
    pub async fn from_store(config: &Config, snapshots: Arc<dyn SnapshotStore>) -> Self {
        let mut writable = true;
        let (mut store, mut dirty) = match snapshots.load().await {
            Ok(Some(store)) => {
                for d in store.stock_discrepancies() {
                    tracing::warn!(
                        part_id = %d.part_id,
                        recorded = d.recorded,
                        expected = d.expected,
                        "saldo gravado não bate com as transações aprovadas"
                    );
                }
                tracing::info!("✅ Snapshot carregado");
                (store, false)
            }
            Ok(None) => {
                tracing::info!("Nenhum snapshot salvo; usando dados iniciais");
                (seeded_store(), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "falha ao carregar o snapshot; usando dados iniciais");
                match snapshots.quarantine().await {
                    Ok(moved_to) => {
                        tracing::warn!(%moved_to, "snapshot ilegível guardado à parte");
                        (seeded_store(), true)
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "🔥 snapshot ilegível não pôde ser separado; gravação desligada até intervenção manual"
                        );
                        writable = false;
                        (seeded_store(), false)
                    }
                }
            }
        };

        let verifier: Arc<dyn CredentialVerifier> = match config.password_scheme {
            PasswordScheme::Plaintext => Arc::new(PlaintextVerifier),
            PasswordScheme::Bcrypt => Arc::new(BcryptVerifier::with_cost(config.bcrypt_cost)),
        };
        match upgrade_stored_passwords(&mut store, verifier.as_ref()).await {
            Ok(0) => {}
            Ok(_) => dirty = true,
            Err(e) => tracing::warn!(error = %e, "falha ao converter senhas gravadas"),
        }

        let persister = if writable {
            Persister::spawn(snapshots)
        } else {
            Persister::disabled()
        };
        if dirty {
            persister.schedule(store.clone());
        }

        // --- Monta o gráfico de dependências ---
        let inventory_service = InventoryService::new();

        Self {
            store: Arc::new(RwLock::new(store)),
            persister,
            auth_service: AuthService::new(verifier, config.allow_universal_secret),
            repair_service: RepairService::new(inventory_service.clone(), config.repair_auto_approve),
            inventory_service,
            assignment_service: AssignmentService::new(),
            billing_service: BillingService::new(),
            staff_service: StaffService::new(),
            settings_service: SettingsService::new(),
            dashboard_service: DashboardService::new(),
        }
    }

    pub fn store(&self) -> &RwLock<EntityStore> {
        &self.store
    }

    pub async fn read<T>(&self, f: impl FnOnce(&EntityStore) -> T) -> T {
        let store = self.store.read().await;
        f(&store)
    }

    /// Roda a mutação inteira sob a guarda de escrita, sem ponto de suspensão
    /// entre checagem e efeito. Trabalha num rascunho: erro não deixa rastro.
    /// Aceita, agenda o snapshot (falha de gravação não desfaz nada).
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut EntityStore) -> Result<T, AppError>) -> Result<T, AppError> {
        let mut store = self.store.write().await;
        let mut draft = store.clone();
        let out = f(&mut draft)?;
        *store = draft;
        self.persister.schedule(store.clone());
        Ok(out)
    }

    pub async fn snapshot(&self) -> EntityStore {
        self.store.read().await.clone()
    }

    /// Grava o último snapshot pendente antes de sair.
    pub async fn shutdown(&self) {
        self.persister.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert_eq!(config.snapshot_path, PathBuf::from("mobifix_db.json"));
        assert!(config.repair_auto_approve);
        assert!(config.allow_universal_secret);
        assert_eq!(config.password_scheme, PasswordScheme::Plaintext);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn flags_and_scheme_are_parsed() {
        let config = config_from(&[
            ("ALLOW_UNIVERSAL_SECRET", "false"),
            ("REPAIR_AUTO_APPROVE", "0"),
            ("PASSWORD_SCHEME", "bcrypt"),
            ("DATABASE_URL", ""),
        ])
        .unwrap();
        assert!(!config.allow_universal_secret);
        assert!(!config.repair_auto_approve);
        assert_eq!(config.password_scheme, PasswordScheme::Bcrypt);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn garbage_values_are_startup_errors() {
        assert!(config_from(&[("REPAIR_AUTO_APPROVE", "talvez")]).is_err());
        assert!(config_from(&[("PASSWORD_SCHEME", "md5")]).is_err());
        assert!(config_from(&[("BCRYPT_COST", "dez")]).is_err());
        assert!(config_from(&[("BCRYPT_COST", "2")]).is_err());
        assert_eq!(config_from(&[("BCRYPT_COST", "6")]).unwrap().bcrypt_cost, 6);
    }
}
