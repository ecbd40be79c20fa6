//! Configuration management for rolecall-bot

#[path = "config_tests.rs"]
mod config_tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord: DiscordBotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Discord bot specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordBotConfig {
    /// Bot token from the Discord developer portal
    #[serde(default = "default_bot_token")]
    pub bot_token: String,
    /// Prefix for text commands, e.g. `!` for `!bind`
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

/// Where per-guild state files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Environment lookup, injectable for tests.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

/// `ReadEnv` backed by the real process environment.
pub struct ProcessEnv;

impl ReadEnv for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_impl(&ProcessEnv)
    }

    pub fn from_env_impl(env: &impl ReadEnv) -> Result<Self> {
        let bot_token = env
            .var("DISCORD_BOT_TOKEN")
            .context("DISCORD_BOT_TOKEN not set")?;

        let command_prefix = env
            .var("ROLECALL_PREFIX")
            .unwrap_or_else(default_command_prefix);

        let data_dir = env.var("ROLECALL_DATA_DIR").unwrap_or_else(default_data_dir);

        Ok(Config {
            discord: DiscordBotConfig {
                bot_token,
                command_prefix,
            },
            storage: StorageConfig { data_dir },
        })
    }
}

fn default_bot_token() -> String {
    std::env::var("DISCORD_BOT_TOKEN").unwrap_or_default()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}
