//! `cwmpd` — TR-069 (CWMP) client agent.

mod config;
mod dispatch;
mod scheduler;
mod session;
mod transport;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

use config::AgentConfig;
use session::SessionEngine;

/// TR-069 client agent with UCI integration.
#[derive(Parser)]
#[command(name = "cwmpd", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Connection-request listener port
    #[arg(long, default_value = "7547")]
    connection_request_port: u16,

    /// Increase logging verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the long-running client
    Init,
    /// Send a single Inform with the given event code, then exit
    Inform {
        /// TR-069 event code, e.g. "2 PERIODIC" or "6 CONNECTION REQUEST"
        event: String,
    },
}

fn init_logging(verbose_level: u8) -> anyhow::Result<()> {
    let log_level = match verbose_level {
        0 => "info,russh=warn,reqwest=warn",
        1 => "debug,russh=info,reqwest=info",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = Registry::default().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(false)
            .compact(),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Periodically snapshots wireless state into `/etc/config/tr069`.
async fn refresh_loop() {
    const TR069_PACKAGE: &str = "/etc/config/tr069";
    let executor = cwmp_collector::Executor::new(cwmp_collector::ExecConfig::default());
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(300));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match cwmp_collector::uci::UciFile::load(TR069_PACKAGE, "tr069").await {
            Ok(mut store) => {
                if let Err(error) =
                    cwmp_collector::refresh::refresh_wifi(&executor, &mut store).await
                {
                    warn!(%error, "wifi refresh failed");
                }
            }
            Err(error) => warn!(%error, "cannot open tr069 snapshot store"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = AgentConfig::load(&args.config)?;
    info!(acs_url = %config.acs_url, "configuration loaded");

    let bootstrap_marker = args
        .config
        .parent()
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join("bootstrapped");

    let (events_tx, events_rx) = scheduler::event_queue();
    let mut engine = SessionEngine::new(config, bootstrap_marker, events_tx.clone())?;

    match args.command {
        Command::Inform { event } => {
            engine.inform_once(&event).await.map_err(|error| {
                error!(%error, "inform failed");
                anyhow::anyhow!("inform failed: {error}")
            })?;
            info!("inform sent successfully");
            Ok(())
        }
        Command::Init => {
            let listener_events = events_tx.clone();
            let port = args.connection_request_port;
            tokio::spawn(async move {
                if let Err(error) =
                    scheduler::connection_request_listener(port, listener_events).await
                {
                    error!(%error, port, "connection-request listener failed");
                }
            });
            tokio::spawn(scheduler::watch_config(args.config.clone(), events_tx.clone()));
            tokio::spawn(refresh_loop());

            // announce ourselves, then settle into the periodic loop
            events_tx
                .send(scheduler::Event::Boot)
                .await
                .map_err(|_| anyhow::anyhow!("event queue closed before startup"))?;

            info!("CWMP client initialized, running periodic informs");
            engine.run(events_rx).await;
            Ok(())
        }
    }
}
