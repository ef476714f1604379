//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use mobifix_backoffice::{
    app,
    config::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carrega o .env antes do logger, para o RUST_LOG valer
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new(&config).await?;

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app(app_state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Último snapshot pendente vai para o disco/banco antes de sair
    app_state.shutdown().await;
    tracing::info!("👋 Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("🔥 Falha ao escutar o sinal de encerramento: {:?}", e);
        std::future::pending::<()>().await;
    }
}
