//! fedwatch CLI
//!
//! Watches a court registry's "online files" listing and announces new case
//! documents on a Bluesky feed. Credentials come from the `FEDWATCH_USER`
//! and `FEDWATCH_PASS` environment variables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fedwatch::{
    error::{AppError, Result},
    feed::BskyFeed,
    models::Config,
    pipeline,
    services::HttpFetcher,
    utils::http,
};

/// fedwatch - Court Registry Watcher
#[derive(Parser, Debug)]
#[command(
    name = "fedwatch",
    version,
    about = "Announces new court registry documents on Bluesky"
)]
struct Cli {
    /// Path to the TOML configuration file
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
    /// Detect new case documents and announce them
    Watch {
        /// Override the configured lookback window in days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Delete recent announcements from the feed
    Purge,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Read feed credentials from the environment.
fn feed_credentials() -> Result<(String, String)> {
    let user = std::env::var("FEDWATCH_USER")
        .map_err(|_| AppError::config("FEDWATCH_USER environment variable not set"))?;
    let pass = std::env::var("FEDWATCH_PASS")
        .map_err(|_| AppError::config("FEDWATCH_PASS environment variable not set"))?;
    Ok((user, pass))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("fedwatch starting...");

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Watch { days } => {
            if let Some(days) = days {
                config.watch.lookback_days = days;
            }
            config.validate()?;

            let client = http::create_client(&config.crawler)?;
            let (user, pass) = feed_credentials()?;
            let feed = BskyFeed::login(client.clone(), &config.feed, &user, &pass).await?;
            let publisher = pipeline::Publisher::new(&feed, &config, &client).await?;
            let fetcher = HttpFetcher::new(client);

            let outcome = pipeline::run_watch(&config, &fetcher, &publisher).await?;
            if outcome.failures > 0 {
                log::warn!("{} case(s) failed this run", outcome.failures);
            }
        }

        Command::Purge => {
            config.validate()?;

            let client = http::create_client(&config.crawler)?;
            let (user, pass) = feed_credentials()?;
            let feed = BskyFeed::login(client, &config.feed, &user, &pass).await?;

            let deleted = pipeline::run_purge(&feed, config.feed.page_limit).await?;
            log::info!("Purge removed {} post(s)", deleted);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    log::info!("Done!");

    Ok(())
}
