use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `SKILL_MARKET__BLOCKCHAIN__PRIVATE_KEY`
const ENV_PREFIX: &str = "SKILL_MARKET";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // Default log filter, overridden by RUST_LOG
    pub log_level: String,

    // Network and contract settings
    pub blockchain: BlockchainSettings,

    // Terminal output settings
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockchainSettings {
    pub network: String,
    pub rpc_url: String,
    pub marketplace_address: String,
    pub token_address: String,
    pub token_symbol: String,
    /// Signing key for the active account. Only read from the environment or
    /// a hand-edited config file; never written back.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub format: DisplayFormat,
    /// Ask before removing a listing
    pub confirm_removals: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    Text,
    Json,
}

impl Default for BlockchainSettings {
    fn default() -> Self {
        Self {
            network: "alfajores".to_string(),
            rpc_url: "https://alfajores-forno.celo-testnet.org".to_string(),
            marketplace_address: "0x3AAabCa1496b9a42C4d6f9eb48b4f8C9Ad1374A5".to_string(),
            token_address: "0x874069Fa1Eb16D44d622F2e0Ca25eeA172369bC1".to_string(), // cUSD
            token_symbol: "cUSD".to_string(),
            private_key: None,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            format: DisplayFormat::Text,
            confirm_removals: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            blockchain: BlockchainSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

pub struct ConfigService {
    // Effective settings: file layered under the environment
    config: AppConfig,
    // File layer alone; this is what `save` writes back
    file_config: AppConfig,
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        let config_path = dirs::config_dir()
            .map(|p| p.join("skill-market").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"));

        Self::with_path(config_path)
    }

    /// Load from an explicit path, falling back to defaults if it can't be read
    pub fn with_path(config_path: PathBuf) -> Self {
        Self::with_environment(config_path, environment())
    }

    fn with_environment(config_path: PathBuf, env: config::Environment) -> Self {
        let config = match Self::load(&config_path, Some(env)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default configuration: {}", e);
                AppConfig::default()
            }
        };
        let file_config = Self::load(&config_path, None).unwrap_or_default();

        Self {
            config,
            file_config,
            config_path,
        }
    }

    /// Layer the optional TOML file under the environment source, if any
    fn load(path: &Path, env: Option<config::Environment>) -> Result<AppConfig> {
        let mut builder = config::Config::builder().add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(false),
        );
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        builder
            .build()
            .and_then(|settings| settings.try_deserialize::<AppConfig>())
            .map_err(|e| MarketError::ConfigError(e.to_string()))
    }

    pub fn get(&self) -> AppConfig {
        self.config.clone()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Write the file layer back. Environment overrides are not persisted.
    pub fn save(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MarketError::ConfigError(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(&self.file_config)
            .map_err(|e| MarketError::ConfigError(e.to_string()))?;

        std::fs::write(&self.config_path, contents)
            .map_err(|e| MarketError::ConfigError(e.to_string()))?;

        log::info!("Configuration saved to {:?}", self.config_path);
        Ok(())
    }
}

/// `SKILL_MARKET__*` variables, e.g. `SKILL_MARKET__BLOCKCHAIN__RPC_URL`
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).separator("__")
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
