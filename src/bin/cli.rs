//! Archive CLI
//!
//! Local execution entry point. Every command runs a fresh sync; nothing is
//! persisted between runs. For the HTTP boundary, use `archive-server`.

use std::path::PathBuf;

use archive_sync::{
    error::Result,
    models::Config,
    pipeline::{self, MonthFilter},
    services::fetch_entry_text,
    store,
};
use clap::{Parser, Subcommand};

/// Archive - searchable mirror of a document database
#[derive(Parser, Debug)]
#[command(name = "archive", version, about = "Sync and search a document archive")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Serve entries from a JSON fixture instead of the API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full sync and print a summary
    Sync,

    /// Search titles and bodies
    Search {
        /// Case-insensitive substring; empty matches everything
        #[arg(short, long, default_value = "")]
        query: String,

        /// Month filter (YYYY-MM) or "all"
        #[arg(short, long, default_value = "all")]
        month: MonthFilter,
    },

    /// List month facets, newest first
    Facets,

    /// Print the flattened body of one entry
    Content {
        /// Entry id
        #[arg(long)]
        page_id: String,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    init_logging(cli.verbose, &config.logging.level);

    log::debug!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK");
        match config.source_id() {
            Ok(id) => log::info!("✓ Source database: {}", id),
            Err(e) => log::warn!("{}", e),
        }
        return Ok(());
    }

    config.validate()?;
    let store = store::open(&config, cli.fixture.as_deref())?;

    match cli.command {
        Command::Content { page_id } => {
            let text = fetch_entry_text(store.as_ref(), &page_id).await?;
            println!("{text}");
        }

        Command::Sync => {
            let snapshot = pipeline::run_sync(store, &config).await?;
            println!("Entries:       {}", snapshot.entries().len());
            println!("Months:        {}", snapshot.facets().len());
            println!("Bodies cached: {}", snapshot.cache().len());
            println!("Bodies failed: {}", snapshot.cache().failed_count());
        }

        Command::Search { query, month } => {
            let snapshot = pipeline::run_sync(store, &config).await?;
            let results = snapshot.search(&query, &month);

            log::info!(
                "{} of {} entries match {:?} ({})",
                results.len(),
                snapshot.entries().len(),
                query,
                month
            );
            for entry in results {
                println!(
                    "{:<10}  {}  [{}]",
                    entry.date.as_deref().unwrap_or("-"),
                    entry.title,
                    entry.id
                );
            }
        }

        Command::Facets => {
            // Facets only need the catalog
            let snapshot = pipeline::sync::fetch_catalog(store, &config).await?;
            println!("{:<8}  {:>5}", "all", snapshot.entries().len());
            for bucket in snapshot.facets() {
                println!("{:<8}  {:>5}", bucket.month_key, bucket.count);
            }
        }

        Command::Validate => {}
    }

    Ok(())
}
