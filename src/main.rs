//! crawld server entry point: CLI flags, logging, and signal-driven
//! shutdown around the HTTP control plane.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crawld::{api, Crawler};

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(
    name = "crawld",
    version,
    about = "Concurrent same-domain web crawler with an HTTP control plane"
)]
struct Cli {
    /// Server bind address
    #[arg(short = 'a', long, default_value = "127.0.0.1")]
    address: String,

    /// Server bind port to listen on
    #[arg(short = 'p', long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let crawler = Crawler::new();
    let app = api::router(Arc::clone(&crawler));

    let bind = format!("{}:{}", cli.address, cli.port);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("crawler http server listening on {bind}");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    wait_for_signal().await?;
    info!("received shutdown signal, draining http server");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_DEADLINE, server).await {
        Ok(served) => served.context("http server task failed")??,
        Err(_) => {
            warn!("http server did not drain within {SHUTDOWN_DEADLINE:?}, continuing shutdown")
        }
    }

    crawler.close().await?;
    Ok(())
}

/// Resolves when SIGINT, SIGQUIT, or SIGTERM is delivered.
async fn wait_for_signal() -> anyhow::Result<()> {
    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut quit = signal(SignalKind::quit()).context("failed to install SIGQUIT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::select! {
        _ = interrupt.recv() => {}
        _ = quit.recv() => {}
        _ = terminate.recv() => {}
    }
    Ok(())
}
