use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pondkeeper_lib::application::ports::{LocalStore, SyncQueueStore};
use pondkeeper_lib::domain::value_objects::{AccountId, SyncQueueStatus, TableName};
use pondkeeper_lib::infrastructure::database::Database;
use pondkeeper_lib::infrastructure::offline::{SqliteLocalStore, SqliteSyncQueue};
use pondkeeper_lib::{init_logging, AppConfig, AppState};
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "pondkeeper")]
#[command(about = "Inspect and sync the offline farm record store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database URL
    #[arg(long, env = "POND_DATABASE_URL")]
    database_url: Option<String>,

    /// Base URL of the hosted table API
    #[arg(long, env = "POND_REMOTE_URL")]
    remote_url: Option<String>,

    /// Log filter (trace, debug, info, warn, error or a full RUST_LOG directive)
    #[arg(short, long, default_value = "info", env = "POND_LOG")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the local copy of every table with the remote rows for an account
    Hydrate {
        #[arg(long)]
        account: String,
    },
    /// Replay pending queue entries now, ignoring backoff
    Drain,
    /// Show queued mutations
    Queue {
        /// Show dead-lettered entries instead of pending ones
        #[arg(long)]
        failed: bool,
    },
    /// Move dead-lettered entries back to pending
    Requeue,
    /// Print the cached rows of one table for an account
    List {
        #[arg(long)]
        table: TableName,
        #[arg(long)]
        account: String,
    },
    /// Queue counters and connectivity
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(url) = cli.remote_url {
        config.remote.base_url = Some(url);
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    info!("pondkeeper v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Hydrate { account } => {
            let account = parse_account(account)?;
            let state = AppState::new(config).await?;
            let report = state.sync_service.download_user_data(&account).await?;
            print_json(&report)?;
            state.shutdown();
        }
        Commands::Drain => {
            let state = AppState::new(config).await?;
            let outcome = state.sync_service.process_after_reconnect().await?;
            print_json(&outcome)?;
            state.shutdown();
        }
        Commands::Requeue => {
            let state = AppState::new(config).await?;
            let requeued = state.sync_service.requeue_failed().await?;
            print_json(&json!({ "requeued": requeued }))?;
            state.shutdown();
        }
        Commands::Queue { failed } => {
            let queue = SqliteSyncQueue::new(Database::initialize(&config.database).await?);
            let status = if failed {
                SyncQueueStatus::Failed
            } else {
                SyncQueueStatus::Pending
            };
            print_json(&queue.list(status).await?)?;
        }
        Commands::List { table, account } => {
            let account = parse_account(account)?;
            let store = SqliteLocalStore::new(Database::initialize(&config.database).await?);
            print_json(&store.list(table, &account).await?)?;
        }
        Commands::Status => {
            let queue = SqliteSyncQueue::new(Database::initialize(&config.database).await?);
            print_json(&json!({
                "pending": queue.count(SyncQueueStatus::Pending).await?,
                "failed": queue.count(SyncQueueStatus::Failed).await?,
                "remote": config.remote.base_url,
                "autoSync": config.sync.auto_sync,
            }))?;
        }
    }

    Ok(())
}

fn parse_account(raw: String) -> Result<AccountId> {
    AccountId::new(raw).map_err(anyhow::Error::msg)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
