use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::RwLock, time::MissedTickBehavior};
use tracing_subscriber::EnvFilter;

mod clients;
mod config;
mod controllers;
mod errors;
mod handlers;
mod models;
mod routes;
mod runtime;

use runtime::{Manifest, Runtime, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + once flag ---
    let (cfg, once) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        endpoint = %cfg.endpoint,
        manifest = %cfg.manifest.display(),
        interval_secs = cfg.sync_interval.as_secs(),
        "Starting influxdb-reconciler"
    );

    // --- Shared API client + runtime ---
    let influx = clients::InfluxClient::new(&cfg.endpoint, cfg.token.clone());
    let api = Arc::new(influx.clone());
    let store = Arc::new(RwLock::new(Store::new()));
    let runtime = Arc::new(Runtime::new(api.clone(), api.clone(), api, store.clone()));

    // --- Single pass mode ---
    if once {
        let manifest = Manifest::load(&cfg.manifest).await?;
        runtime.sync(manifest).await;
        let summary = runtime.run_pass().await;
        if summary.failed > 0 {
            anyhow::bail!("{} resource(s) failed to reconcile", summary.failed);
        }
        return Ok(());
    }

    let reconcile_task = tokio::spawn(sync_loop(
        runtime,
        cfg.manifest.clone(),
        cfg.sync_interval,
    ));

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(handlers::AppState { store, influx });

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Status server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reconcile_task.abort();
    Ok(())
}

/// Reload the manifest and run a pass on every tick. A manifest that fails
/// to load keeps the previously applied one in force.
async fn sync_loop(runtime: Arc<Runtime>, manifest: PathBuf, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match Manifest::load(&manifest).await {
            Ok(loaded) => {
                runtime.sync(loaded).await;
            }
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "manifest not applied"),
        }
        runtime.run_pass().await;
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
