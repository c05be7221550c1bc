//! keyless - single-door access controller
//!
//! Entry point for the controller service and its administration commands:
//! - `run` (default): poll the scanner and drive the strike until signalled
//! - `badge`: manage badges in the configured datastore
//! - `check-config`: validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keyless_controller::config::{DEFAULT_CONFIG_PATH, is_log_level};
use keyless_controller::{Controller, ControllerConfig, banner, load_config};
use keyless_core::{BadgeId, BadgeKind};
use keyless_store::{AnyStore, Badge, BadgeStore};
use std::path::PathBuf;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// keyless - Badge scanner and door strike controller
#[derive(Parser, Debug)]
#[command(name = "keyless", version)]
#[command(about = "Badge scanner and door strike controller", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "KEYLESS_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Log level override (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the controller until SIGINT or SIGTERM
    Run,

    /// Manage badges in the configured datastore
    Badge {
        #[command(subcommand)]
        action: BadgeAction,
    },

    /// Validate the configuration file and print a summary
    CheckConfig,
}

#[derive(Subcommand, Debug)]
enum BadgeAction {
    /// List every badge
    List,

    /// Show one badge
    Show { id: BadgeId },

    /// Add a badge
    Add {
        id: BadgeId,

        /// card, sticker, keychain or other
        #[arg(short, long, default_value = "other")]
        kind: BadgeKind,

        /// Add the badge disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Allow a badge to open the door
    Enable { id: BadgeId },

    /// Stop a badge from opening the door
    Disable { id: BadgeId },

    /// Remove a badge
    Delete { id: BadgeId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.application.log_level.clone());
    if !is_log_level(&level) {
        anyhow::bail!("Unknown log level '{level}'");
    }
    init_tracing(&level.to_ascii_lowercase());

    info!(config_path = %args.config.display(), "Configuration loaded");

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&config).await,
        Command::Badge { action } => badge(&config, action).await,
        Command::CheckConfig => {
            println!("{} is valid", args.config.display());
            print!("{}", banner::render(&config));
            Ok(())
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(config: &ControllerConfig) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;

    let controller = Controller::start(config)
        .await
        .context("Failed to start controller")?;

    eprint!("{}", banner::render(config));

    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down gracefully"),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
        }
    };

    let stats = controller
        .run_until(shutdown)
        .await
        .context("Controller did not shut down cleanly")?;

    info!(
        scanned = stats.scanned,
        granted = stats.granted,
        denied = stats.denied,
        lookup_failures = stats.lookup_failures,
        scanner_errors = stats.scanner_errors,
        unlock_failures = stats.unlock_failures,
        "Service exited"
    );
    Ok(())
}

async fn badge(config: &ControllerConfig, action: BadgeAction) -> Result<()> {
    let store = AnyStore::open_or_create(&config.datastore)
        .await
        .with_context(|| format!("Failed to open datastore {:?}", config.datastore.path))?;

    let result = match action {
        BadgeAction::List => store.list_badges().await.map(|badges| {
            for badge in &badges {
                print_badge(badge);
            }
            println!("{} badge(s)", badges.len());
        }),
        BadgeAction::Show { id } => store.get_badge(&id).await.map(|badge| print_badge(&badge)),
        BadgeAction::Add { id, kind, disabled } => store
            .create_badge(&id, kind, !disabled)
            .await
            .map(|badge| print_badge(&badge)),
        BadgeAction::Enable { id } => store
            .enable_badge(&id)
            .await
            .map(|()| println!("{id} enabled")),
        BadgeAction::Disable { id } => store
            .disable_badge(&id)
            .await
            .map(|()| println!("{id} disabled")),
        BadgeAction::Delete { id } => store
            .delete_badge(&id)
            .await
            .map(|()| println!("{id} deleted")),
    };

    store.close().await;
    result.context("Badge command failed")
}

fn print_badge(badge: &Badge) {
    println!(
        "{:<20} {:<9} {:<8} {}",
        badge.id.as_str(),
        badge.kind.as_str(),
        if badge.enabled { "enabled" } else { "disabled" },
        badge.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
}
