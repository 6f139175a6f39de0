use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use homeconnectd::Config;
use homeconnectd::Engine;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Home Connect appliance daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "homeconnectd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    tracing::info!("homeconnectd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let mut engine = Engine::new();
    engine.register_integrations_from_config(&config);
    tracing::info!("{} integrations registered", engine.integration_count());
    let engine = Arc::new(engine);

    let (api_shutdown_tx, api_shutdown_rx) = tokio::sync::oneshot::channel();
    let api_handle = if config.api.enabled {
        let listen = config.api.listen.clone();
        let port = config.api.port;
        let engine = engine.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = homeconnectd::api::serve(listen, port, engine, api_shutdown_rx).await {
                tracing::error!("HTTP API server failed: {}", e);
            }
        }))
    } else {
        tracing::info!("HTTP API disabled");
        None
    };

    engine
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received shutdown signal"),
                Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
            }
        })
        .await;

    let _ = api_shutdown_tx.send(());
    if let Some(handle) = api_handle {
        if let Err(e) = handle.await {
            tracing::warn!("HTTP API task ended abnormally: {}", e);
        }
    }

    match Arc::try_unwrap(engine) {
        Ok(engine) => engine.shutdown().await,
        Err(_) => tracing::warn!("Engine still referenced, skipping integration shutdown"),
    }

    tracing::info!("homeconnectd shutdown complete");
    Ok(())
}
