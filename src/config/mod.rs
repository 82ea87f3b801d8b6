//! # Configuration
//!
//! StarMUD reads a single TOML file. Every section has defaults, so a file only needs
//! the values it changes.
//!
//! ```toml
//! [world]
//! data_dir = "data"
//! docs_dir = "docs"
//!
//! [accounts]
//! db_path = "data/accounts.db"
//!
//! [tick]
//! interval_ms = 2000
//! corpse_decay_secs = 360
//! reset_interval_secs = 300     # 0 disables periodic resets
//! autosave_interval_secs = 900  # 0 disables autosave
//! # rng_seed = 42
//!
//! [rules]
//! overkill_multiplier = 2       # dead at hp <= -(2 * max hp)
//!
//! [logging]
//! level = "info"
//! file = "starmud.log"
//! ```
//!
//! ```rust,no_run
//! use starmud::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("world data in {}", config.world.data_dir);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::world::entity::DamageRules;
use crate::world::scheduler::MAX_DELAY;
use crate::world::tick::TickSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Areas, items, mobs, ships, planets and player files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Help entries.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_docs_dir() -> String {
    "docs".to_string()
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            docs_dir: default_docs_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "data/accounts.db".to_string()
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_corpse_decay_secs")]
    pub corpse_decay_secs: u64,
    #[serde(default = "default_reset_interval_secs")]
    pub reset_interval_secs: u64,
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_corpse_decay_secs() -> u64 {
    360
}

fn default_reset_interval_secs() -> u64 {
    300
}

fn default_autosave_interval_secs() -> u64 {
    900
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            corpse_decay_secs: default_corpse_decay_secs(),
            reset_interval_secs: default_reset_interval_secs(),
            autosave_interval_secs: default_autosave_interval_secs(),
            rng_seed: None,
        }
    }
}

impl TickConfig {
    pub fn corpse_decay(&self) -> Duration {
        Duration::from_secs(self.corpse_decay_secs)
    }

    pub fn settings(&self) -> TickSettings {
        let every = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        TickSettings {
            interval: Duration::from_millis(self.interval_ms.max(1)),
            reset_interval: every(self.reset_interval_secs),
            autosave_interval: every(self.autosave_interval_secs),
            rng_seed: self.rng_seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_overkill_multiplier")]
    pub overkill_multiplier: i32,
}

fn default_overkill_multiplier() -> i32 {
    DamageRules::DEFAULT_OVERKILL_MULTIPLIER
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            overkill_multiplier: default_overkill_multiplier(),
        }
    }
}

impl RulesConfig {
    pub fn damage_rules(&self) -> DamageRules {
        DamageRules {
            overkill_multiplier: self.overkill_multiplier,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("starmud.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules.overkill_multiplier < 0 {
            return Err(anyhow!(
                "rules.overkill_multiplier must not be negative (got {})",
                self.rules.overkill_multiplier
            ));
        }
        if self.tick.corpse_decay() > MAX_DELAY {
            return Err(anyhow!(
                "tick.corpse_decay_secs must be at most {} (got {})",
                MAX_DELAY.as_secs(),
                self.tick.corpse_decay_secs
            ));
        }
        if self.tick.interval_ms == 0 {
            return Err(anyhow!("tick.interval_ms must be greater than zero"));
        }
        Ok(())
    }
}
