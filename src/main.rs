use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use tablebook::config::Config;
use tablebook::engine::Engine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let _log_guard = tablebook::logging::init(
        &config.log_level,
        config.log_json,
        config.log_dir.as_deref(),
    )?;
    tablebook::observability::init(config.metrics_port)?;

    let engine = Arc::new(Engine::connect(&config.store)?);
    if engine.is_durable() {
        let compactor_engine = engine.clone();
        let threshold = config.compact_threshold;
        tokio::spawn(async move {
            tablebook::compactor::run_compactor(compactor_engine, threshold).await;
        });
    }

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        store = %config.store,
        tables = engine.table_count(),
        reservations = engine.reservation_count(),
        metrics_port = ?config.metrics_port,
        "tablebook listening"
    );

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, let in-flight requests finish
    axum::serve(listener, tablebook::api::router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("tablebook stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received, draining requests");
}
