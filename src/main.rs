use std::sync::Arc;

use anyhow::Context;

use matricula_assist::channels::{ChannelManager, CliChannel, webhook_routes};
use matricula_assist::config::BotConfig;
use matricula_assist::dispatcher::TurnDispatcher;
use matricula_assist::faq::FaqStore;
use matricula_assist::flow::FlowContext;
use matricula_assist::logging;
use matricula_assist::store::{InMemoryStateStore, StateStore, spawn_expiry_task};
use matricula_assist::submitter::HttpSubmitter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env().context("Invalid bot configuration")?;
    let _log_guard = logging::init(config.log_dir.as_deref(), "matricula-assist.log");

    eprintln!("🎓 Matrícula Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://{}/api/messages", config.bind_addr());
    eprintln!("   Backend: {}", config.backend_url);

    // ── Conversation engine ─────────────────────────────────────────────
    let faq = Arc::new(FaqStore::load(&config.faq_path).await);
    let context = FlowContext::new(faq).with_confirmation(config.confirm_before_submit);

    let store: Arc<dyn StateStore> = InMemoryStateStore::new();
    let _expiry_handle = spawn_expiry_task(Arc::clone(&store), config.state_idle_timeout);

    let submitter = HttpSubmitter::new(config.backend_url.clone(), config.submit_timeout)
        .context("Failed to build enrollment submitter")?;

    let dispatcher = Arc::new(TurnDispatcher::new(
        store,
        Arc::new(submitter),
        context,
        config.submit_timeout,
    ));

    // ── Webhook server ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!(addr = %config.bind_addr(), "Webhook server started");
    let app = webhook_routes(Arc::clone(&dispatcher));

    if config.cli_enabled {
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        let mut channels = ChannelManager::new();
        channels.add(Arc::new(CliChannel::new()));
        eprintln!("   CLI: type a message and press Enter; numbers pick options.\n");
        channels.run(dispatcher).await?;

        server.abort();
    } else {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Ctrl+C received, shutting down...");
            })
            .await
            .context("Webhook server failed")?;
    }

    Ok(())
}
