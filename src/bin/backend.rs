use std::sync::Arc;

use anyhow::Context;

use matricula_assist::backend::{LibSqlRepository, enrollment_routes};
use matricula_assist::config::BackendConfig;
use matricula_assist::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BackendConfig::from_env();
    let _log_guard = logging::init(config.log_dir.as_deref(), "matricula-backend.log");

    let repository = LibSqlRepository::new_local(&config.db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;

    eprintln!("🗂️  Backend de Matrículas v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   API: http://{}/api/matriculas", config.bind_addr());

    let app = enrollment_routes(Arc::new(repository));
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!(addr = %config.bind_addr(), "Enrollment backend started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Ctrl+C received, shutting down...");
        })
        .await
        .context("Backend server failed")?;

    Ok(())
}
