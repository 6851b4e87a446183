use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info};

use ccpanel::{router, DashboardState, Runner};
use ccpanel_call_engine::ChannelBroadcaster;
use ccpanel_infra_common::{log_welcome, parse_log_level, setup_logging, AppConfig, LoggingConfig};

/// Pending dashboard requests before handlers wait on the runner
const COMMAND_QUEUE_SIZE: usize = 64;

#[derive(Parser, Debug)]
#[command(author, version, about = "Live call-center dashboard for Asterisk", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = args.log_level {
        parse_log_level(&level)?;
        config.logging.level = level;
    }

    if args.print_config {
        println!("{}", config.to_redacted_json()?);
        return Ok(());
    }

    setup_logging(LoggingConfig::from_settings(&config.logging, env!("CARGO_PKG_NAME"))?)?;
    log_welcome(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let broadcaster = ChannelBroadcaster::new(config.dashboard.broadcast_capacity);
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_SIZE);

    let listener = TcpListener::bind(&config.dashboard.bind_addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", config.dashboard.bind_addr))?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    let app = router(DashboardState::new(commands_tx, broadcaster.clone()));
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Dashboard server error: {}", e);
        }
    });

    let address = config.manager.address();
    let stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("Failed to connect to manager at {}", address))?;
    info!("Connected to manager at {}", address);

    let (mut runner, outbound) = Runner::new(Arc::new(broadcaster));
    runner.login(&config.manager)?;

    runner
        .run(stream, outbound, commands_rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
}
