use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use vitals_monitor::{
    MessageQueue, PubSub, VitalService,
    actors::{AlertWorker, MessageWorker},
    api::{ApiConfig, ApiState, spawn_api_server},
    config::Config,
    models::Event,
    storage::{MemoryStore, Store},
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (default: ~/.config/vitals-monitor/server.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file and environment
    #[arg(short, long)]
    bind: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("vitals_monitor", LevelFilter::DEBUG),
        ("vitals_server", LevelFilter::TRACE),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

/// Cancel the returned token on SIGINT or SIGTERM
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
                        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                    }
                }
                Err(e) => {
                    warn!("failed to install SIGTERM handler: {e}");
                    let _ = tokio::signal::ctrl_c().await;
                    info!("received SIGINT, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl+C, shutting down");
        }

        trigger.cancel();
    });

    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env()?;
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("--bind is not a socket address: {bind}"))?;
    }

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let pubsub = PubSub::<Event>::new();
    let service = VitalService::new(store.clone(), Arc::new(pubsub.clone()));
    let queue = MessageQueue::with_poll_interval(
        config.messages.delay_range()?,
        config.messages.poll_interval(),
    );

    let shutdown = install_signal_handler();

    // Subscribe before the API accepts readings so none are missed
    let alert_worker = AlertWorker::new(&pubsub, store.clone(), config.alert_buffer)
        .with_message_queue(queue.clone())
        .spawn(shutdown.clone());
    let message_worker = MessageWorker::new(queue.clone()).spawn(shutdown.clone());

    let api_config = ApiConfig {
        bind_addr: config.bind_addr,
        enable_cors: config.enable_cors,
    };
    let state = ApiState::new(service, queue);
    let (addr, api_server) = match spawn_api_server(api_config, state, shutdown.clone()).await {
        Ok(server) => server,
        Err(e) => {
            shutdown.cancel();
            return Err(e);
        }
    };
    info!("vitals server ready on http://{addr}");

    shutdown.cancelled().await;

    pubsub.close();
    if let Err(e) = store.close() {
        warn!("failed to close store: {e}");
    }

    for (name, handle) in [
        ("API server", api_server),
        ("alert worker", alert_worker),
        ("message worker", message_worker),
    ] {
        if let Err(e) = handle.await {
            error!("{name} terminated abnormally: {e}");
        }
        debug!("{name} stopped");
    }

    info!("shutdown complete");
    Ok(())
}
