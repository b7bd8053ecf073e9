mod cli;

use clap::Parser;
use dotenvy::dotenv;
use leave_ledger::{
    config::{database, defaults},
    core::ledger::{LeaveLedger, LedgerDefaults},
    errors::Result,
    storage::SystemStateStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    let cli = cli::Cli::parse();

    // 3. Load default quotas and holidays
    let config = defaults::load_config_or_default(&cli.config)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let ledger_defaults = LedgerDefaults {
        quotas: config.default_quotas()?,
        records: Vec::new(),
    };
    let holidays = config.holiday_calendar();

    // 4. Open the database and the ledger
    let database_url = cli
        .database_url
        .clone()
        .unwrap_or_else(database::get_database_url);
    let db = database::create_connection(&database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    let mut ledger = LeaveLedger::open(SystemStateStore::new(db), ledger_defaults).await;
    if ledger.is_degraded() {
        warn!("Storage could not be read; working from defaults in memory only");
    }

    // 5. Run the command
    cli.run(&mut ledger, &holidays).await
}
