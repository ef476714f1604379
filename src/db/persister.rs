// src/db/persister.rs
//
// Worker de write-behind: cada mutação aceita publica o snapshot mais recente
// num canal `watch`; o worker salva em segundo plano. Rajadas de mutações
// colapsam no último estado. Falhas viram aviso, a memória nunca é revertida.
//
// Sem worker (`disabled`), nada é gravado: o documento salvo fica intocado
// até alguém intervir.

use std::sync::Arc;
use tokio::{
    sync::{watch, Mutex, Notify},
    task::JoinHandle,
};

use crate::db::persistence::{Snapshot, SnapshotStore};

type Latest = Option<Arc<Snapshot>>;

#[derive(Clone)]
pub struct Persister {
    inner: Arc<Inner>,
}

struct Inner {
    tx: watch::Sender<Latest>,
    shutdown: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
    enabled: bool,
}

impl Persister {
    /// Precisa ser chamado dentro de um runtime tokio.
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> Self {
        let (tx, rx) = watch::channel::<Latest>(None);
        let shutdown = Arc::new(Notify::new());
        let worker = tokio::spawn(run_save_loop(store, rx, shutdown.clone()));

        Self {
            inner: Arc::new(Inner {
                tx,
                shutdown,
                worker: Mutex::new(Some(worker)),
                enabled: true,
            }),
        }
    }

    /// Persister que recusa toda gravação.
    pub fn disabled() -> Self {
        let (tx, _rx) = watch::channel::<Latest>(None);
        Self {
            inner: Arc::new(Inner {
                tx,
                shutdown: Arc::new(Notify::new()),
                worker: Mutex::new(None),
                enabled: false,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    /// Não bloqueia: só troca o snapshot pendente.
    pub fn schedule(&self, snapshot: Snapshot) {
        if !self.inner.enabled {
            tracing::debug!("gravação desligada; snapshot descartado");
            return;
        }
        self.inner.tx.send_replace(Some(Arc::new(snapshot)));
    }

    /// Salva o que estiver pendente e encerra o worker.
    pub async fn shutdown(&self) {
        self.inner.shutdown.notify_one();
        if let Some(worker) = self.inner.worker.lock().await.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "worker de persistência terminou com erro");
            }
        }
    }
}

async fn run_save_loop(
    store: Arc<dyn SnapshotStore>,
    mut rx: watch::Receiver<Latest>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                save_latest(store.as_ref(), &mut rx).await;
            }
            _ = shutdown.notified() => {
                if rx.has_changed().unwrap_or(false) {
                    save_latest(store.as_ref(), &mut rx).await;
                }
                break;
            }
        }
    }
    tracing::debug!("worker de persistência encerrado");
}

async fn save_latest(store: &dyn SnapshotStore, rx: &mut watch::Receiver<Latest>) {
    let latest = rx.borrow_and_update().clone();
    let Some(snapshot) = latest else {
        return;
    };

    match store.save(&snapshot).await {
        Ok(()) => tracing::debug!("snapshot salvo"),
        Err(e) => tracing::warn!(
            error = %e,
            "falha ao salvar o snapshot; o estado em memória foi mantido"
        ),
    }
}
