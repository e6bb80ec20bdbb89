//! Tracker CLI - announce new Twitter followings of tracked accounts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use notify::{NotificationMessage, Notifier};
use tracker::auth::CredentialPool;
use tracker::config::{PollConfig, RetryPolicy, TrackerConfig};
use tracker::discovery::DiscoveryEngine;
use tracker::fetcher::FollowingsFetcher;
use tracker::formatter::NotificationFormatter;
use tracker::scheduler::{CycleOutcome, PollScheduler};
use tracker::storage::{AccountStore, JsonAccountStore, TrackedAccount};
use tracker::twitter::{FollowingsApi, TwitterClient, DEFAULT_API_BASE};

/// Tracker CLI - Watch who tracked Twitter accounts start following.
#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Twitter followings tracker")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll tracked accounts until interrupted
    Run(RunArgs),

    /// Run a single poll cycle and wait for its notifications to be delivered
    Once(RunArgs),

    /// Register an account for tracking
    Add {
        /// Screen name of the account
        username: String,

        /// External user ID (defaults to the screen name)
        #[arg(long)]
        user_id: Option<String>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Stop tracking an account
    Remove {
        /// Screen name of the account
        username: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List tracked accounts
    List {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
pub struct StoreArgs {
    /// Account store file
    #[arg(long, env = "TRACKER_STORE", default_value = "accounts.json")]
    store: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    /// Credentials file
    #[arg(long, env = "TRACKER_CONFIG", default_value = "twitter_config.json")]
    config: PathBuf,

    #[command(flatten)]
    store: StoreArgs,

    /// Accounts requested per followings page
    #[arg(long, env = "TRACKER_PAGE_SIZE", default_value = "200")]
    page_size: u32,

    /// Seconds to wait after a rate-limit response
    #[arg(long, env = "TRACKER_RATE_LIMIT_BACKOFF_SECS", default_value = "3")]
    rate_limit_backoff_secs: u64,

    /// Rate-limit responses tolerated per page
    #[arg(long, env = "TRACKER_MAX_RATE_LIMIT_RETRIES", default_value = "10")]
    max_rate_limit_retries: u32,

    /// Seconds to wait after a network or server failure
    #[arg(long, env = "TRACKER_TRANSIENT_BACKOFF_SECS", default_value = "5")]
    transient_backoff_secs: u64,

    /// Network or server failures tolerated per page
    #[arg(long, env = "TRACKER_MAX_TRANSIENT_RETRIES", default_value = "5")]
    max_transient_retries: u32,

    /// Seconds to sleep when no accounts are registered
    #[arg(long, env = "TRACKER_IDLE_BACKOFF_SECS", default_value = "10")]
    idle_backoff_secs: u64,

    /// Twitter API base URL
    #[arg(long, env = "TRACKER_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

impl RunArgs {
    fn poll_config(&self) -> PollConfig {
        PollConfig {
            page_size: self.page_size,
            retry: RetryPolicy {
                rate_limit_backoff: Duration::from_secs(self.rate_limit_backoff_secs),
                max_rate_limit_retries: self.max_rate_limit_retries,
                transient_backoff: Duration::from_secs(self.transient_backoff_secs),
                max_transient_retries: self.max_transient_retries,
            },
            idle_backoff: Duration::from_secs(self.idle_backoff_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "tracker=debug,notify=debug,info"
    } else {
        "tracker=info,notify=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(cli.log_json.then(|| fmt::layer().json()))
        .with((!cli.log_json).then(fmt::layer))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run(args) => run_forever(args).await,
        Commands::Once(args) => run_once(args).await,
        Commands::Add {
            username,
            user_id,
            store,
        } => run_add(username, user_id, store).await,
        Commands::Remove { username, store } => run_remove(&username, store).await,
        Commands::List { store } => run_list(store).await,
    }
}

/// Wire the scheduler together and hand back the receiving end of its queue.
fn build_scheduler(
    args: &RunArgs,
) -> Result<(PollScheduler, mpsc::UnboundedReceiver<NotificationMessage>)> {
    let config = TrackerConfig::load(&args.config)
        .with_context(|| format!("Failed to load credentials from {}", args.config.display()))?;
    let pool = Arc::new(CredentialPool::new(config.apps)?);
    tracing::info!(sessions = pool.len(), "Loaded credentials");

    let store: Arc<dyn AccountStore> = Arc::new(open_store(&args.store)?);
    let api: Arc<dyn FollowingsApi> = Arc::new(TwitterClient::with_base_url(&args.api_base)?);
    let poll = args.poll_config();

    let fetcher = FollowingsFetcher::new(api.clone(), pool.clone(), poll.page_size, poll.retry);
    let engine = DiscoveryEngine::new(fetcher, store.clone());
    let formatter = NotificationFormatter::new(api, pool);

    let (tx, rx) = notify::queue();
    let scheduler = PollScheduler::new(store, engine, formatter, Arc::new(tx), poll.idle_backoff);

    Ok((scheduler, rx))
}

fn open_store(args: &StoreArgs) -> Result<JsonAccountStore> {
    JsonAccountStore::open(&args.store)
        .with_context(|| format!("Failed to open account store {}", args.store.display()))
}

async fn run_forever(args: RunArgs) -> Result<()> {
    let (scheduler, rx) = build_scheduler(&args)?;
    let delivery = tokio::spawn(Notifier::from_env().run(rx));

    tokio::select! {
        () = scheduler.run_forever() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Received Ctrl-C, shutting down");
        }
    }

    // Closing the queue lets the delivery worker flush and exit.
    drop(scheduler);
    delivery.await.context("Delivery worker panicked")?;

    Ok(())
}

async fn run_once(args: RunArgs) -> Result<()> {
    let (scheduler, rx) = build_scheduler(&args)?;
    let delivery = tokio::spawn(Notifier::from_env().run(rx));

    let outcome = scheduler.run_cycle().await;
    drop(scheduler);
    delivery.await.context("Delivery worker panicked")?;

    match outcome {
        CycleOutcome::EmptyRoster => println!("No accounts are being tracked."),
        CycleOutcome::RosterUnavailable => anyhow::bail!("Failed to load accounts"),
        CycleOutcome::Completed(report) => {
            println!("Poll Cycle Summary");
            println!("   Accounts: {}", report.accounts);
            println!("   Enumerated: {}", report.enumerated);
            println!("   Checked: {}", report.checked);
            println!("   New followings: {}", report.new_followings);
            println!("   Notified: {}", report.notified);

            if !report.failed_accounts.is_empty() {
                println!("   Failed: {}", report.failed_accounts.len());
                for username in &report.failed_accounts {
                    eprintln!("     - {username}");
                }
            }
        }
    }

    Ok(())
}

async fn run_add(username: String, user_id: Option<String>, args: StoreArgs) -> Result<()> {
    let store = open_store(&args)?;
    let user_id = user_id.unwrap_or_else(|| username.clone());

    store
        .add_account(TrackedAccount::new(user_id, &username))
        .await?;
    println!("Now tracking @{username}");

    Ok(())
}

async fn run_remove(username: &str, args: StoreArgs) -> Result<()> {
    let store = open_store(&args)?;

    if store.remove_account(username).await? {
        println!("Stopped tracking @{username}");
    } else {
        println!("@{username} is not tracked");
    }

    Ok(())
}

async fn run_list(args: StoreArgs) -> Result<()> {
    let store = open_store(&args)?;
    let accounts = store.all_accounts().await?;

    if accounts.is_empty() {
        println!("No accounts are being tracked.");
        return Ok(());
    }

    for account in &accounts {
        let state = if account.tracked {
            "tracked"
        } else {
            "pending"
        };
        println!(
            "@{} ({}) {} | {} followings | cursor {}",
            account.username,
            account.user_id,
            state,
            account.followings_list.len(),
            account.cursor
        );
    }

    println!("Total: {} accounts", accounts.len());

    Ok(())
}
