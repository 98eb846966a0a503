// gate-host: locks one resource behind a gesture challenge and exits once the
// challenge page reports completion.

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use gesture_gate::server::ControlServer;
use gesture_gate::session::{ResolveReason, SessionOutcome, SessionRegistry};
use gesture_gate::GateConfig;

#[derive(Debug, Parser)]
#[command(name = "gate-host", about = "Serve a gesture challenge guarding one resource")]
struct Args {
    /// Identifier of the locked resource
    #[arg(long, default_value = "default")]
    resource: String,

    /// Human-readable name shown on the challenge page
    #[arg(long)]
    name: Option<String>,

    /// JSON configuration file
    #[arg(long, env = "GESTURE_GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file
    #[arg(long, env = "GESTURE_GATE_ADDR")]
    addr: Option<String>,

    /// Number of stages per challenge
    #[arg(long)]
    stages: Option<usize>,

    /// Resolve the session as failed if nobody completes it in time (e.g. "10m")
    #[arg(long, value_parser = humantime::parse_duration)]
    expiry: Option<Duration>,
}

fn load_config(args: &Args) -> anyhow::Result<GateConfig> {
    let mut config = match &args.config {
        Some(path) => GateConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GateConfig::default(),
    };
    if let Some(addr) = &args.addr {
        config.listen_addr = addr.clone();
    }
    if let Some(stages) = args.stages {
        config.stage_count = stages;
    }
    if args.expiry.is_some() {
        config.session_expiry = args.expiry;
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<bool> {
    let config = load_config(&args)?;
    let display_name = args.name.clone().unwrap_or_else(|| args.resource.clone());

    let registry = SessionRegistry::from_config(&config);
    let outcome_rx = registry.open_awaitable(args.resource.clone(), display_name);

    let server = ControlServer::bind(config, registry.clone()).await?;
    let handle = server.spawn()?;
    info!("Open http://{}/?resource={} to unlock '{}'", handle.addr, args.resource, args.resource);

    let expiry_task = registry.spawn_expiry_task();

    let outcome = tokio::select! {
        outcome = outcome_rx => outcome.context("session dropped without an outcome")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for ctrl-c")?;
            warn!("Interrupted; cancelling session for '{}'", args.resource);
            registry.cancel(&args.resource);
            SessionOutcome { success: false, reason: ResolveReason::Cancelled }
        }
    };

    if let Some(task) = expiry_task {
        task.abort();
    }
    handle.shutdown().await;

    info!("Session for '{}' finished: {:?}", args.resource, outcome);
    Ok(outcome.success)
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
