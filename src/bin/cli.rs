//! alpaca-watch CLI
//!
//! Local execution entry point for the challenge watcher.

use std::path::PathBuf;
use std::sync::Arc;

use alpaca_watch::{
    error::Result,
    models::Config,
    notify::{Notifier, WebhookSender},
    pipeline::{Scheduler, TickOutcome},
    services::ListingFetcher,
    storage::LocalStateStore,
};
use clap::{Parser, Subcommand};

/// alpaca-watch - AlpacaHack challenge watcher
#[derive(Parser, Debug)]
#[command(
    name = "alpaca-watch",
    version,
    about = "Watches the AlpacaHack challenge listing and announces changes"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the periodic watcher loop
    Run,

    /// Execute a single check now
    Check,

    /// Validate the configuration file
    Validate,

    /// Show persisted state info without fetching
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Wire the scheduler from configuration.
fn build_scheduler(config: &Arc<Config>) -> Result<Scheduler> {
    let source = Arc::new(ListingFetcher::new(Arc::clone(config))?);
    let store = Arc::new(LocalStateStore::new(&config.paths.state_file));
    let sender = Arc::new(WebhookSender::new(&config.notify)?);
    let notifier = Notifier::new(sender, &config.notify);

    Ok(Scheduler::new(
        config.tracker.clone(),
        source,
        store,
        notifier,
    ))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let config = Arc::new(config);

    match cli.command {
        Command::Run => {
            config.validate()?;
            log::info!(
                "Watching {} for channel {}",
                config.platform.listing_url,
                config.notify.channel_id
            );

            let scheduler = build_scheduler(&config)?;
            scheduler.run().await;
        }

        Command::Check => {
            config.validate()?;
            let scheduler = build_scheduler(&config)?;

            match scheduler.try_tick().await {
                TickOutcome::Completed(report) => {
                    log::info!(
                        "Check complete: {} challenges, {} created, {} solve increases, {} removed, {} messages sent",
                        report.challenge_count,
                        report.created,
                        report.solves_increased,
                        report.removed,
                        report.messages_sent
                    );
                }
                TickOutcome::Failed(e) => return Err(e),
                TickOutcome::Skipped | TickOutcome::Deferred => {
                    log::warn!("Check did not run");
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            log::info!("All validations passed!");
        }

        Command::Info => {
            let store = LocalStateStore::new(&config.paths.state_file);
            match store.load_data().await? {
                Some(data) => {
                    log::info!("State file: {}", config.paths.state_file);
                    log::info!("Last updated: {}", data.updated_at);
                    log::info!("Tracked challenges: {}", data.count);
                }
                None => {
                    log::info!("No state file yet at {}", config.paths.state_file);
                }
            }
        }
    }

    Ok(())
}
