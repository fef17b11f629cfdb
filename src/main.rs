use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use teloxide::Bot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use homework_bot::api::PracticumClient;
use homework_bot::config;
use homework_bot::detector::ChangeDetector;
use homework_bot::notifier::TelegramNotifier;
use homework_bot::poller::Poller;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Watch homework review status and report changes to Telegram"
)]
struct Args {
    /// Path to optional YAML config file; environment variables override it
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let cfg = match config::load(Some(&args.config)) {
        Ok(cfg) => cfg,
        Err(err) => {
            if let config::ConfigError::Missing(names) = &err {
                for name in names {
                    error!(variable = *name, "required configuration value is missing");
                }
            }
            error!(%err, "critical configuration error; shutting down");
            return Err(err.into());
        }
    };
    info!(?cfg, "configuration loaded");

    let api = PracticumClient::with_endpoint(cfg.practicum.token.clone(), cfg.endpoint()?)?;
    let bot = Bot::new(cfg.telegram.bot_token.clone());
    let notifier = TelegramNotifier::new(bot, cfg.recipient()?);
    let detector = ChangeDetector::new(cfg.detector.compare_by);
    let started_at = chrono::Utc::now().timestamp();

    let mut poller = Poller::new(api, notifier, started_at, detector);
    if args.once {
        info!(from_date = started_at, "running a single cycle");
        if poller.tick().await.is_none() {
            warn!("single cycle failed");
        }
        return Ok(());
    }

    poller.run().await;
    Ok(())
}
