//! rolemenu binary: reaction-role menus reconciled against a hot-reloadable
//! settings document.

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

mod adapter;
mod bot;
mod fetch;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use serenity::all::GatewayIntents;
use serenity::Client;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::{BotOptions, RoleMenuBot};

#[derive(Parser)]
#[command(name = "rolemenu")]
#[command(about = "Reaction-role menu bot with desired-state reconciliation")]
#[command(version)]
struct Cli {
    /// Local settings cache, read at startup and rewritten on reload
    #[arg(long, default_value = "settings.json")]
    settings_file: PathBuf,

    /// Remote settings document fetched when a reload is requested
    #[arg(long)]
    settings_url: String,

    /// Append-only log file
    #[arg(long, default_value = "rolemenu.log")]
    log_file: PathBuf,

    /// Maximum channel history depth scanned per reconciliation pass
    #[arg(long, default_value_t = 100)]
    history_limit: u8,
}

fn init_tracing(log_file: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    let token = std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;

    info!("Bot starting");

    let bot = RoleMenuBot::new(BotOptions {
        settings_path: cli.settings_file,
        settings_url: cli.settings_url,
        history_limit: cli.history_limit,
    })?;

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES;

    let mut client = Client::builder(&token, intents)
        .event_handler(bot)
        .await
        .context("could not build gateway client")?;

    client.start().await.context("gateway client stopped")?;
    Ok(())
}
