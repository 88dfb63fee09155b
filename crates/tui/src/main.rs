mod app;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use ledger_core::{
    config::{self, AppConfig},
    JsonFileStore, Ledger,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Terminal ledger for factory game resources, products and jobs.
#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    /// Directory holding the store document; overrides the configured `data_dir`.
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    init_logging(&config.log_dir)?;

    let store_path = config.store_path();
    let store = JsonFileStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store {}", store_path.display()))?;
    info!(path = %store_path.display(), "store opened");

    let ledger = Ledger::open(store, &config.default_tab).await;
    let mut app = app::LedgerApp::new(ledger, config);
    app.run().await
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("factory-ledger.log");
    // Open once so an unwritable log file fails start-up instead of the writer.
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn data_dir_forms() {
        let cli = Cli::try_parse_from(["factory-ledger"]).unwrap();
        assert_eq!(cli.data_dir, None);

        let cli = Cli::try_parse_from(["factory-ledger", "--data-dir", "/tmp/a"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/a")));

        let cli = Cli::try_parse_from(["factory-ledger", "--data-dir=/tmp/b"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/b")));

        assert!(Cli::try_parse_from(["factory-ledger", "--data-dir"]).is_err());
        assert!(Cli::try_parse_from(["factory-ledger", "--verbose"]).is_err());
    }
}
