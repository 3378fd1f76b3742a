//! BETLEDGER entry point.
//!
//! Loads configuration, initialises structured logging, opens the ledger
//! database and serves the HTTP API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use betledger::api::{self, ApiState};
use betledger::config;
use betledger::storage::SqliteLedger;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load_or_default(CONFIG_PATH)?;
    init_logging(&cfg);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %cfg.database.url,
        port = cfg.server.port,
        "BETLEDGER starting up"
    );

    let ledger = Arc::new(SqliteLedger::open(&cfg.database).await?);
    let state = ApiState::new(ledger.clone());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("Shutdown signal received.");
    };

    let served = api::serve(state, &cfg.server, shutdown).await;

    ledger.close().await;
    info!("BETLEDGER stopped");
    served
}

/// Initialise the tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. JSON output is enabled by
/// `logging.json` or the `BETLEDGER_LOG_JSON` variable.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));

    if cfg.logging.json {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
