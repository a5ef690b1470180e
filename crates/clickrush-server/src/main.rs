//! Entry point: identity store, coordinator, and the two ingress listeners.

use anyhow::Context;
use clickrush::store::IdentityStore;
use clickrush::Coordinator;
use clickrush_server::config::ServerConfig;
use clickrush_server::{http, tcp};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clickrush=info,clickrush_server=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(?config, "starting clickrush server");

    // The identity store must be reachable before the session starts;
    // failure aborts startup with no retry.
    let store = open_store(&config.store_url)
        .await
        .context("identity store unavailable")?;

    let (coordinator, coordinator_task) = Coordinator::spawn(config.engine.clone(), Arc::clone(&store))?;
    coordinator.start_session().await?;

    let cancel = CancellationToken::new();

    let http_listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", config.http_addr))?;
    let tcp_listener = TcpListener::bind(config.tcp_addr)
        .await
        .with_context(|| format!("failed to bind tcp listener on {}", config.tcp_addr))?;
    tracing::info!(http = %config.http_addr, tcp = %config.tcp_addr, "ingress listening");

    let app = http::router(http::AppState {
        coordinator: coordinator.clone(),
        store,
    });
    let http_cancel = cancel.clone();
    let http_task = tokio::spawn(async move {
        let shutdown = async move { http_cancel.cancelled().await };
        if let Err(e) = axum::serve(http_listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "http server error");
        }
    });
    let tcp_task = tokio::spawn(tcp::serve(
        tcp_listener,
        coordinator.clone(),
        cancel.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");

    cancel.cancel();
    let _ = http_task.await;
    let _ = tcp_task.await;
    coordinator.shutdown();
    let _ = coordinator_task.await;
    tracing::info!("server stopped");
    Ok(())
}

async fn open_store(url: &str) -> anyhow::Result<Arc<dyn IdentityStore>> {
    if url == "memory:" {
        tracing::warn!("using the in-memory identity store; registrations will not survive restarts");
        return Ok(Arc::new(clickrush::store::MemoryIdentityStore::new()));
    }
    #[cfg(feature = "sql")]
    {
        let store = clickrush::store::SqliteIdentityStore::connect(url).await?;
        let store: Arc<dyn IdentityStore> = Arc::new(store);
        Ok(store)
    }
    #[cfg(not(feature = "sql"))]
    {
        anyhow::bail!(
            "store url {url} requires the `sql` feature; set CLICKRUSH_STORE_URL=memory:"
        )
    }
}
