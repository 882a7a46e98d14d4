//! Vigil CLI
//!
//! Watches a web page for change signals and notifies subscribers.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use vigil_core::{
    log_telemetry, SelectorSpec, SubscriberId, UrlTable, WatchConfig, DEFAULT_FILES_DIR,
    DEFAULT_REDIRECT_WAIT_MS, DEFAULT_REGISTRY_FILENAME, DEFAULT_SCREENSHOT_QUALITY,
};
use vigil_inspect::{ArtifactStore, RenderConfig, RenderInspector};
use vigil_notify::{
    AddOutcome, NotificationDispatcher, RemoveOutcome, SubscriberRegistry, TelegramConfig,
    TelegramMessenger,
};
use vigil_runtime::{TriggerHandle, Watcher};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about = "Vigil: page change watch & notification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, default_value = "vigil.toml")]
    config: PathBuf,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Telegram bot token (or set VIGIL_BOT_TOKEN)
    #[arg(long, env = "VIGIL_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Render service API key (or set VIGIL_RENDER_KEY)
    #[arg(long, env = "VIGIL_RENDER_KEY")]
    render_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a target and notify subscribers when a change signal fires
    Check {
        /// Index into the configured target table
        #[arg(short, long)]
        target: Option<usize>,
    },

    /// Inspect a target and send the full detail report to the admin channel
    Details {
        /// Index into the configured target table
        #[arg(short, long)]
        target: Option<usize>,
    },

    /// Send a liveness message to every subscriber
    Ping,

    /// Register a subscriber chat
    Subscribe { chat_id: i64 },

    /// Deregister a subscriber chat
    Unsubscribe { chat_id: i64 },

    /// Send the latest stored screenshot to a chat
    Screenshot { chat_id: i64 },

    /// Show configuration and registry status
    Status,
}

/// Configuration file layout (`vigil.toml`)
#[derive(Debug, Deserialize)]
struct FileConfig {
    /// Watch targets; trigger indexes resolve against this table
    targets: Vec<String>,
    #[serde(default)]
    selectors: Vec<SelectorEntry>,
    redirect_pattern: Option<String>,
    #[serde(default = "default_redirect_wait")]
    redirect_wait_ms: u64,
    #[serde(default = "default_screenshot_quality")]
    screenshot_quality: u8,
    /// Directory holding artifacts and the registry file
    #[serde(default = "default_files_dir")]
    files_dir: PathBuf,
    #[serde(default = "default_registry_file")]
    registry_file: String,
    /// Chat receiving detail reports and audit lines
    admin_chat_id: i64,
    #[serde(default)]
    render: RenderSection,
    #[serde(default)]
    telegram: TelegramSection,
}

#[derive(Debug, Deserialize)]
struct SelectorEntry {
    name: String,
    css: String,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSection {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramSection {
    bot_token: Option<String>,
}

fn default_redirect_wait() -> u64 {
    DEFAULT_REDIRECT_WAIT_MS
}

fn default_screenshot_quality() -> u8 {
    DEFAULT_SCREENSHOT_QUALITY
}

fn default_files_dir() -> PathBuf {
    PathBuf::from(DEFAULT_FILES_DIR)
}

fn default_registry_file() -> String {
    DEFAULT_REGISTRY_FILENAME.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let config = load_config(&cli.config)?;

    if let Commands::Status = cli.command {
        return show_status(&config);
    }

    let handle = build_handle(&config, cli.bot_token, cli.render_key)?;

    match cli.command {
        Commands::Check { target } => {
            handle.request_check(target).await;
            handle.drain().await;
        }
        Commands::Details { target } => {
            handle.request_details(target).await;
            handle.drain().await;
        }
        Commands::Ping => {
            handle.request_status_ping().await;
            handle.drain().await;
        }
        Commands::Subscribe { chat_id } => {
            match handle.subscribe(SubscriberId(chat_id)).await? {
                AddOutcome::Added => println!("Subscribed {}", chat_id),
                AddOutcome::AlreadyPresent => println!("{} is already subscribed", chat_id),
            }
        }
        Commands::Unsubscribe { chat_id } => {
            match handle.unsubscribe(SubscriberId(chat_id)).await? {
                RemoveOutcome::Removed => println!("Unsubscribed {}", chat_id),
                RemoveOutcome::NotPresent => println!("{} was not subscribed", chat_id),
            }
        }
        Commands::Screenshot { chat_id } => {
            handle.send_latest_screenshot(SubscriberId(chat_id)).await;
        }
        Commands::Status => unreachable!("handled above"),
    }

    Ok(())
}

fn load_config(path: &PathBuf) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn build_handle(
    config: &FileConfig,
    bot_token: Option<String>,
    render_key: Option<String>,
) -> Result<TriggerHandle> {
    let token = bot_token
        .or_else(|| config.telegram.bot_token.clone())
        .context("Bot token required. Set VIGIL_BOT_TOKEN or [telegram].bot_token")?;

    let telemetry = log_telemetry();

    let watch = WatchConfig {
        selectors: config
            .selectors
            .iter()
            .map(|s| SelectorSpec::new(&s.name, &s.css))
            .collect(),
        redirect_pattern: config.redirect_pattern.clone(),
        redirect_wait_ms: config.redirect_wait_ms,
        screenshot_quality: config.screenshot_quality,
    };

    let mut render = RenderConfig::default();
    if let Some(endpoint) = &config.render.endpoint {
        render.endpoint = endpoint.clone();
    }
    render.api_key = render_key.or_else(|| config.render.api_key.clone());
    if let Some(timeout) = config.render.timeout_secs {
        render.timeout_secs = timeout;
    }

    let artifacts = ArtifactStore::new(&config.files_dir);
    let inspector = RenderInspector::new(render, watch, artifacts.clone(), telemetry.clone())
        .context("failed to build inspector")?;

    let messenger =
        Arc::new(TelegramMessenger::new(TelegramConfig::new(&token)).context("failed to build messenger")?);
    let dispatcher = NotificationDispatcher::new(
        messenger,
        SubscriberId(config.admin_chat_id),
        telemetry.clone(),
    );

    let registry = Arc::new(SubscriberRegistry::new(
        config.files_dir.join(&config.registry_file),
        telemetry.clone(),
    ));

    let watcher = Arc::new(Watcher::new(
        Arc::new(inspector),
        registry,
        dispatcher,
        artifacts,
        UrlTable::new(config.targets.clone()),
        telemetry,
    ));

    Ok(TriggerHandle::new(watcher))
}

fn show_status(config: &FileConfig) -> Result<()> {
    let telemetry = log_telemetry();
    let registry = SubscriberRegistry::new(
        config.files_dir.join(&config.registry_file),
        telemetry,
    );
    let artifacts = ArtifactStore::new(&config.files_dir);

    println!("Targets: {}", config.targets.len());
    for (i, url) in config.targets.iter().enumerate() {
        println!("  [{}] {}", i, url);
    }
    println!("Selectors: {}", config.selectors.len());
    println!("Subscribers: {}", registry.list().len());
    println!(
        "Screenshot: {}",
        if artifacts.screenshot_path().exists() {
            artifacts.screenshot_path().display().to_string()
        } else {
            "(none yet)".to_string()
        }
    );
    println!(
        "Snapshot: {}",
        if artifacts.snapshot_path().exists() {
            artifacts.snapshot_path().display().to_string()
        } else {
            "(none yet)".to_string()
        }
    );

    Ok(())
}
