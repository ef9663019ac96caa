/*
[INPUT]:  CLI arguments, YAML configuration file, environment, OS shutdown signals
[OUTPUT]: Running TON Proof auth HTTP server with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ton_proof_auth::{AuthOrchestrator, ChainKeyResolver, TonApiClient};
use ton_proof_server::{AppState, ServerConfig, router};

#[derive(Parser, Debug)]
#[command(name = "ton-proof-server", version, about = "TON Proof wallet authentication server")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "check-config")]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(
        config_path = ?args.config_path,
        check_config = args.check_config,
        "starting ton-proof-server"
    );

    let config = ServerConfig::load(args.config_path.as_deref()).context("load config")?;
    info!(
        listen_addr = %config.listen_addr,
        domains = ?config.auth.allowed_domains,
        "configuration loaded"
    );

    if args.check_config {
        info!("check-config requested; configuration validated");
        return Ok(());
    }

    let client = TonApiClient::with_config(&config.chain).context("build chain client")?;
    let auth = AuthOrchestrator::new(&config.auth, Arc::new(ChainKeyResolver::new(client)))
        .context("build auth orchestrator")?;
    let app = router(AppState::new(auth));

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "listening");

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("serve http")?;
    info!("server shutdown complete");

    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    tokio::spawn(cancel_when(wait_for_signal(), shutdown));
}

async fn cancel_when(signal: impl Future<Output = ()>, shutdown: CancellationToken) {
    signal.await;
    shutdown.cancel();
}

async fn wait_for_signal() {
    tokio::select! {
        () = interrupt() => info!("received SIGINT"),
        () = terminate() => info!("received SIGTERM"),
    }
}

async fn interrupt() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install SIGINT handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_cancels_shutdown_token() {
        let shutdown = CancellationToken::new();
        cancel_when(async {}, shutdown.clone()).await;
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_no_signal_keeps_serving() {
        let shutdown = CancellationToken::new();
        let waiting = tokio::time::timeout(
            Duration::from_millis(20),
            cancel_when(std::future::pending(), shutdown.clone()),
        )
        .await;
        assert!(waiting.is_err());
        assert!(!shutdown.is_cancelled());
    }
}
