// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use boxtail::engine::Engine;
use boxtail::error::{Error, Result};
use boxtail::inventory::docker::{DockerInventory, DEFAULT_CONTAINERS_DIR, DEFAULT_SOCKET};
use boxtail::inventory::files::FileInventory;
use boxtail::inventory::Inventory;
use boxtail::reconciler::Reconciler;
use boxtail::sinks::{self, SinkType};

#[derive(Debug, Parser)]
#[command(name = "boxtail")]
#[command(version, about = "Follows container and file logs and forwards structured records")]
struct Arguments {
    /// Where records are delivered
    #[arg(value_enum, long, env = "BOXTAIL_SINK", default_value = "print")]
    sink: SinkType,

    /// Sink target, e.g. udp://host:port (udp and syslog sinks)
    #[arg(long, env = "BOXTAIL_SINK_URL")]
    sink_url: Option<String>,

    /// Disable docker container discovery
    #[arg(long, env = "BOXTAIL_NO_DOCKER")]
    no_docker: bool,

    /// Docker API socket
    #[arg(long, env = "BOXTAIL_DOCKER_SOCKET", default_value = DEFAULT_SOCKET)]
    docker_socket: PathBuf,

    /// Directory holding per-container json-file logs
    #[arg(long, env = "BOXTAIL_CONTAINERS_DIR", default_value = DEFAULT_CONTAINERS_DIR)]
    containers_dir: PathBuf,

    /// Additional plain files to follow (repeatable)
    #[arg(long = "file", env = "BOXTAIL_FILES", value_delimiter = ',')]
    files: Vec<PathBuf>,

    /// Seconds between inventory reconciliations
    #[arg(long, env = "BOXTAIL_RECONCILE_INTERVAL", default_value = "6")]
    reconcile_interval: u64,

    /// Bound in seconds on the readiness wait
    #[arg(long, env = "BOXTAIL_POLL_TIMEOUT", default_value = "1")]
    poll_timeout: u64,

    /// Log level filter (RUST_LOG syntax)
    #[arg(long, env = "BOXTAIL_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Arguments::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Arguments) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "boxtail starting");

    let mut sink = sinks::build(args.sink, args.sink_url.as_deref()).await?;

    let mut inventories: Vec<Box<dyn Inventory>> = Vec::new();
    if !args.no_docker {
        inventories.push(Box::new(DockerInventory::new(
            args.docker_socket,
            args.containers_dir,
        )));
    }
    if !args.files.is_empty() {
        inventories.push(Box::new(FileInventory::new(args.files)));
    }
    if inventories.is_empty() {
        return Err(Error::Config(
            "nothing to follow: docker discovery disabled and no --file given".to_string(),
        ));
    }

    let reconciler = Reconciler::new(inventories, Duration::from_secs(args.reconcile_interval));
    let mut engine = Engine::new(reconciler, Duration::from_secs(args.poll_timeout));

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone())?;

    engine.run(sink.as_mut(), cancel).await;
    info!("boxtail stopped");
    Ok(())
}

fn spawn_signal_handler(cancel: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        info!("shutdown signal received");
        cancel.cancel();
    });
    Ok(())
}
