//! # RecipeBot
//!
//! Posts recipes from a JSON catalog to a Telegram channel on a schedule,
//! never repeating one until the whole catalog has been delivered.
//!
//! Usage:
//!   recipebot                          # Use ~/.recipebot/config.toml + env
//!   recipebot --config ./bot.toml      # Custom config file
//!   recipebot --dry-run --once         # Print one recipe to stdout and exit

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use recipebot_catalog::{Catalog, JsonFileSource, Selector};
use recipebot_channels::{ConsoleChannel, TelegramChannel, TelegramConfig};
use recipebot_core::RecipeBotConfig;
use recipebot_core::config::DispatchShape;
use recipebot_core::traits::Channel;
use recipebot_scheduler::{Cadence, DispatchPipeline, FeedbackLoop, Scheduler};

#[derive(Parser)]
#[command(
    name = "recipebot",
    version,
    about = "🍲 RecipeBot — scheduled recipe posts, no repeats until the catalog runs out"
)]
struct Cli {
    /// Config file (default: ~/.recipebot/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Catalog JSON file (overrides config and RECIPEBOT_CATALOG)
    #[arg(long)]
    catalog: Option<String>,

    /// Run a single dispatch cycle and exit
    #[arg(long)]
    once: bool,

    /// Print posts to stdout instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

fn init_logging(cli: &Cli) {
    let filter = if cli.verbose { "recipebot=debug" } else { "recipebot=info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<RecipeBotConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = expand_path(path);
            if path.exists() {
                RecipeBotConfig::load_from(&path)?
            } else {
                tracing::info!(
                    "No config at {}, using defaults and environment",
                    path.display()
                );
                RecipeBotConfig::default()
            }
        }
        None => RecipeBotConfig::load()?,
    };

    config.apply_env();
    if let Some(catalog) = &cli.catalog {
        config.catalog.path = catalog.clone();
    }
    config.validate(cli.dry_run)?;
    Ok(config)
}

async fn build_channel(config: &RecipeBotConfig, dry_run: bool) -> Result<Arc<dyn Channel>> {
    if dry_run {
        tracing::info!("🧪 Dry run: posts go to stdout");
        return Ok(Arc::new(ConsoleChannel::new()));
    }

    let telegram = TelegramChannel::new(TelegramConfig::from_channel_config(
        &config.channel,
        config.dispatch.request_timeout_secs,
    ))?;
    match telegram.connect().await {
        Ok(()) => {}
        // Network trouble at startup is retried by the scheduler; a bad token is not
        Err(e) if e.is_transient() => {
            tracing::warn!("⚠️ Telegram getMe failed, continuing: {e}");
        }
        Err(e) => return Err(e).context("Telegram rejected the bot credentials"),
    }
    Ok(Arc::new(telegram))
}

fn build_pipeline(
    config: &RecipeBotConfig,
    channel: Arc<dyn Channel>,
    dry_run: bool,
) -> Result<DispatchPipeline> {
    let timeout = Duration::from_secs(config.dispatch.request_timeout_secs);
    let pipeline = DispatchPipeline::new(channel, config.dispatch.shape, timeout);

    if config.dispatch.shape != DispatchShape::Image {
        return Ok(pipeline);
    }
    if dry_run {
        tracing::info!("🎨 Dry run: image generation skipped, recipes go out as text");
        return Ok(pipeline);
    }

    let generator = recipebot_providers::create_image_generator(
        &config.image,
        config.dispatch.request_timeout_secs,
    )?;
    tracing::info!("🎨 Images by {}", generator.name());
    Ok(pipeline.with_image_generator(Arc::from(generator), config.image.prompt_template.clone()))
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let timeout = Duration::from_secs(config.dispatch.request_timeout_secs);

    let catalog_path = expand_path(&config.catalog.path);
    let catalog = Catalog::load_with(
        Box::new(JsonFileSource::new(catalog_path.clone())),
        Selector::new(),
        Some(timeout),
    )
    .await
    .with_context(|| format!("loading catalog {}", catalog_path.display()))?;

    let cadence = Cadence::from_config(&config.cadence)?;
    let channel = build_channel(&config, cli.dry_run).await?;
    let pipeline = build_pipeline(&config, channel, cli.dry_run)?;

    let mut scheduler = Scheduler::new(
        catalog,
        pipeline,
        cadence,
        Duration::from_secs(config.dispatch.backoff_secs),
    );
    if config.dispatch.shape == DispatchShape::Poll {
        scheduler = scheduler.with_feedback(FeedbackLoop::from_config(&config.feedback));
    }

    if cli.once {
        let outcome = scheduler.dispatch_cycle().await;
        tracing::info!("🏁 Single cycle finished: {outcome}");
        if outcome.is_transient_failure() {
            anyhow::bail!("dispatch did not go through: {outcome}");
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("🛑 Shutdown requested, stopping at the next wait");
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler.run(shutdown_rx).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        tracing::error!("❌ {e:#}");
        return Err(e);
    }
    Ok(())
}
