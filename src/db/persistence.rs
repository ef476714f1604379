// src/db/persistence.rs

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::db::store::EntityStore;

/// O documento salvo é o store inteiro: todas as coleções + configuração do site.
pub type Snapshot = EntityStore;

// Falhas de persistência nunca chegam ao chamador de uma mutação:
// viram um aviso no log (ver db::persister).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Erro de I/O no snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot com JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erro de banco de dados: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Falha nas migrações: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Unavailable(String),
}

/// Contrato do colaborador de persistência: um documento, tudo ou nada.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `None` na primeira execução.
    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError>;

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// Tira do caminho um documento que não carregou, sem apagá-lo,
    /// para que o próximo `save` não o sobrescreva. Devolve onde ficou.
    async fn quarantine(&self) -> Result<String, PersistenceError> {
        Err(PersistenceError::Unavailable(
            "este armazenamento não sabe separar um snapshot ilegível".into(),
        ))
    }
}

fn quarantine_suffix() -> String {
    format!("corrupt-{}", chrono::Utc::now().format("%Y%m%d%H%M%S%3f"))
}

// ---
// Arquivo JSON local
// ---

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        // Escreve ao lado e renomeia, para nunca deixar um arquivo pela metade
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn quarantine(&self) -> Result<String, PersistenceError> {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", quarantine_suffix()));
        let target = PathBuf::from(name);

        tokio::fs::rename(&self.path, &target).await?;
        Ok(target.display().to_string())
    }
}

// ---
// Postgres (uma linha JSONB por chave)
// ---

#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
    key: String,
}

impl PgSnapshotStore {
    pub const DEFAULT_KEY: &'static str = "mobifix";

    pub async fn connect(database_url: &str) -> Result<Self, PersistenceError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!().run(&pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        Ok(Self::from_pool(pool, Self::DEFAULT_KEY))
    }

    pub fn from_pool(pool: PgPool, key: impl Into<String>) -> Self {
        Self { pool, key: key.into() }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let document = sqlx::query_scalar::<_, Json<Snapshot>>(
            "SELECT document FROM app_snapshots WHERE key = $1",
        )
        .bind(&self.key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document.map(|Json(snapshot)| snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        // UPSERT (Insert or Update)
        sqlx::query(
            r#"
            INSERT INTO app_snapshots (key, document, saved_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key)
            DO UPDATE SET
                document = EXCLUDED.document,
                saved_at = NOW()
            "#,
        )
        .bind(&self.key)
        .bind(Json(snapshot))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn quarantine(&self) -> Result<String, PersistenceError> {
        let target = format!("{}.{}", self.key, quarantine_suffix());

        // Move a linha inteira para outra chave, numa transação só
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO app_snapshots (key, document, saved_at)
            SELECT $2, document, saved_at FROM app_snapshots WHERE key = $1
            "#,
        )
        .bind(&self.key)
        .bind(&target)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM app_snapshots WHERE key = $1")
            .bind(&self.key)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(target)
    }
}

// ---
// Em memória (testes e execuções efêmeras)
// ---

#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<Snapshot>>,
    saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    pub async fn saved(&self) -> Option<Snapshot> {
        self.slot.lock().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        *self.slot.lock().await = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::seeded_store;

    #[tokio::test]
    async fn json_file_store_round_trips_and_reports_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("mobifix_db.json"));

        assert!(store.load().await.unwrap().is_none());

        store.save(&seeded_store()).await.unwrap();
        let loaded = store.load().await.unwrap().expect("snapshot salvo");
        assert_eq!(loaded.parts().require("P001").unwrap().stock, 12);
        assert_eq!(loaded.employees().len(), 2);
    }

    #[tokio::test]
    async fn quarantine_moves_the_document_aside_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mobifix_db.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = JsonFileStore::new(&path);
        let moved = store.quarantine().await.unwrap();

        assert!(!path.exists());
        assert!(moved.contains("corrupt-"));
        assert_eq!(tokio::fs::read(&moved).await.unwrap(), b"{not json");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_cannot_quarantine() {
        let err = MemorySnapshotStore::new().quarantine().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn json_file_store_surfaces_corrupt_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mobifix_db.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let err = JsonFileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
    }
}
