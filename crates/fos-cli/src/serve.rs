//! # Serve Subcommand
//!
//! Builds a platform from a configuration file and serves the HTTP API
//! until Ctrl+C or SIGTERM. The listen address and bearer tokens come from
//! `FOS_BIND`, `FOS_AUTH_TOKEN` and `FOS_CALLER_TOKENS`; `--bind` overrides
//! the first.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use fos_api::{ApiConfig, AppState};
use fos_core::SystemClock;
use fos_engine::{Platform, PlatformConfig, SharedPlatform};

/// Arguments for the `fos serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to the platform YAML.
    #[arg(long)]
    pub config: PathBuf,

    /// Listen address. Defaults to `FOS_BIND`, then 127.0.0.1:8080.
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Do not install the Prometheus recorder or mount `/metrics`.
    #[arg(long)]
    pub no_metrics: bool,
}

/// Execute the serve subcommand.
pub fn run_serve(args: &ServeArgs) -> Result<u8> {
    let config = PlatformConfig::from_yaml_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let platform = Platform::new(&config, Arc::new(SystemClock))?;

    let mut api_config = ApiConfig::from_env().map_err(|e| anyhow!(e))?;
    if let Some(bind) = args.bind {
        api_config.bind = bind;
    }
    if api_config.is_unauthenticated() {
        tracing::warn!("no API tokens configured; the API accepts unauthenticated requests");
    } else if api_config.caller_tokens.is_empty() {
        tracing::warn!("FOS_CALLER_TOKENS is not set; callers are self-asserted");
    }
    let bind = api_config.bind;

    let mut state = AppState::new(SharedPlatform::new(platform), api_config);
    let mut metrics = None;
    if !args.no_metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing Prometheus recorder")?;
        metrics = Some(handle.clone());
        state = state.with_metrics(handle);
    }

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(serve(state, bind, metrics))?;
    Ok(0)
}

/// Interval between histogram upkeep passes of the Prometheus recorder.
const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

async fn serve(state: AppState, bind: SocketAddr, metrics: Option<PrometheusHandle>) -> Result<()> {
    // `install_recorder` leaves histogram draining to the caller.
    let upkeep = metrics.map(|handle| tokio::spawn(run_metrics_upkeep(handle)));

    let app = fos_api::app(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, "fos API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(task) = upkeep {
        task.abort();
    }
    tracing::info!("fos API stopped");
    Ok(())
}

async fn run_metrics_upkeep(handle: PrometheusHandle) {
    let mut ticker = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
    loop {
        ticker.tick().await;
        handle.run_upkeep();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
