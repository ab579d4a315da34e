use std::net::SocketAddr;
use std::path::PathBuf;

use backend_lib::config::{Settings, StorageBackend, DEFAULT_CONFIG_FILE};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// XML gateway for opening prepaid accounts and reading their balances
#[derive(Parser, Debug)]
#[command(name = "balance-gateway", version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Override the log level
    #[arg(long)]
    log_level: Option<String>,

    /// Override the account store backend
    #[arg(long, value_enum)]
    storage: Option<StorageArg>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StorageArg {
    Memory,
    File,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Memory => StorageBackend::Memory,
            StorageArg::File => StorageBackend::File,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, then apply command line overrides
    let mut settings = Settings::load_from(&cli.config)?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }
    if let Some(storage) = cli.storage {
        settings.storage.backend = storage.into();
    }
    settings.validate()?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!(config = %cli.config.display(), "starting balance gateway");

    backend_lib::run(settings, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
