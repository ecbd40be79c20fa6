//! Rolecall: a Discord reaction-role bot.
//!
//! Administrators bind emoji to roles and publish a self-assignment
//! list; members pick up and drop roles by reacting to it. A small set
//! of channel administration commands rides along.

mod commands;
mod config;
mod errors;
mod handlers;
mod health;
mod host;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rolecall_core::{RoleManager, StateStore};
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handlers::{BotState, Handler};
use crate::health::AppState;
use crate::host::DiscordHost;

/// Rolecall reaction-role bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/rolecall.toml")]
    config: String,

    /// Discord bot token (overrides config file)
    #[arg(long, env = "DISCORD_BOT_TOKEN")]
    bot_token: Option<String>,

    /// Command prefix (overrides config file)
    #[arg(long, env = "ROLECALL_PREFIX")]
    prefix: Option<String>,

    /// Directory for per-guild state files (overrides config file)
    #[arg(long, env = "ROLECALL_DATA_DIR")]
    data_dir: Option<String>,

    /// Health check server port
    #[arg(long, env = "HEALTH_CHECK_PORT", default_value = "3001")]
    health_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolecall_bot=debug,rolecall_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rolecall bot");

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = if std::path::Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, loading from environment");
        Config::from_env()?
    };

    if let Some(bot_token) = args.bot_token {
        config.discord.bot_token = bot_token;
    }
    if let Some(prefix) = args.prefix {
        config.discord.command_prefix = prefix;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    info!("Command prefix: {}", config.discord.command_prefix);
    info!("State directory: {}", config.storage.data_dir);

    let manager = Arc::new(RoleManager::new(StateStore::new(&config.storage.data_dir)));

    // Build serenity client
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let mut client = Client::builder(&config.discord.bot_token, intents)
        .event_handler(Handler)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

    let host = DiscordHost::new(client.http.clone(), client.cache.clone());
    let health_state = AppState::new();

    // Insert shared state into client data
    {
        let mut data = client.data.write().await;
        data.insert::<BotState>(Arc::new(BotState {
            manager,
            host,
            prefix: config.discord.command_prefix.clone(),
        }));
        data.insert::<AppState>(health_state.clone());
    }

    // Start health check server
    let health_port = args.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_state, health_port).await {
            error!("Health server error: {}", e);
        }
    });

    // Graceful shutdown: close all shards on SIGTERM or Ctrl+C.
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.ok();
        }
        info!("Shutdown signal received, stopping Discord client...");
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord gateway connection...");

    // Start the Discord client (blocks until all shards are stopped)
    client
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Discord client error: {}", e))?;

    info!("Rolecall bot stopped");
    Ok(())
}
