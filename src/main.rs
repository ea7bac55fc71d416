//! hostctl-agent main entry point
//!
//! This binary handles CLI parsing, logging setup, and runs the agent until
//! it receives a shutdown signal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hostctl_agent::{
    agent::{self, Agent},
    config::AgentConfig,
    control,
    status::{LogClipboard, MenuAction, StatusController},
    APP_NAME, VERSION,
};
use tokio::signal;

/// LAN remote-management agent
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the agent until interrupted
    Serve {
        /// Listening port (overrides the config; 0 picks a free port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check whether an agent on this host is answering
    Ping {
        /// Port of the running agent
        #[arg(short, long)]
        port: u16,
    },

    /// Print the address clients should use for a port
    Address {
        /// Listening port
        #[arg(short, long)]
        port: u16,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize structured logging with tracing
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AgentConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok(AgentConfig::from_file(path)?)
        }
        None => Ok(AgentConfig::default()),
    }
}

/// Run the CLI command; `Ok(false)` maps to exit status 1
async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Serve { port } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            info!("Starting {} v{}", APP_NAME, VERSION);
            serve(config).await?;
            Ok(true)
        }
        Commands::Ping { port } => {
            let config = load_config(cli.config.as_ref())?;
            let alive = control::probe(port, config.health.timeout()).await;
            println!("{}", if alive { "ok" } else { "unreachable" });
            Ok(alive)
        }
        Commands::Address { port } => {
            println!("{}", agent::format_reachable(agent::lan_ipv4(), port));
            Ok(true)
        }
        Commands::Version => {
            println!("{} v{}", APP_NAME, VERSION);
            Ok(true)
        }
    }
}

/// Start the agent and drive the status controller until a signal arrives
async fn serve(config: AgentConfig) -> anyhow::Result<()> {
    let agent = Agent::new(&config)?;
    agent.start().await?;

    let mut controller = StatusController::new(agent, LogClipboard);
    controller.handle(MenuAction::CopyAddress).await;

    let interval = config.health.interval();
    let mut ticker = interval.map(|period| {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                controller.handle(MenuAction::Quit).await;
                break;
            }
            _ = tick(ticker.as_mut()) => {
                controller.handle(MenuAction::CheckService).await;
            }
        }
    }

    info!("Shutting down agent");
    Ok(())
}

async fn tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
