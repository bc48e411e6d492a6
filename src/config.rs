use crate::crypto::CurveType;
use crate::error::{GenesisError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_AMOUNT: u64 = 99_999_999_999_999;
pub const DEFAULT_POWER: u64 = 9_999_999_999;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenesisConfig {
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Defaults the account and validator builders fall back on
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuilderConfig {
    #[serde(default)]
    pub default_curve: CurveType,
    #[serde(default = "default_amount")]
    pub default_amount: u64,
    #[serde(default = "default_power")]
    pub default_power: u64,
    #[serde(default = "default_account_name_prefix")]
    pub account_name_prefix: String,
    #[serde(default = "default_validator_name_prefix")]
    pub validator_name_prefix: String,
    #[serde(default)]
    pub generate_node_keys: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct KeysConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_amount() -> u64 {
    DEFAULT_AMOUNT
}

fn default_power() -> u64 {
    DEFAULT_POWER
}

fn default_account_name_prefix() -> String {
    "Account_".to_string()
}

fn default_validator_name_prefix() -> String {
    "Validator_".to_string()
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_curve: CurveType::Ed25519,
            default_amount: DEFAULT_AMOUNT,
            default_power: DEFAULT_POWER,
            account_name_prefix: default_account_name_prefix(),
            validator_name_prefix: default_validator_name_prefix(),
            generate_node_keys: false,
        }
    }
}

impl BuilderConfig {
    pub fn account_name(&self, index: usize) -> String {
        format!("{}{}", self.account_name_prefix, index)
    }

    pub fn validator_name(&self, index: usize) -> String {
        format!("{}{}", self.validator_name_prefix, index)
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            builder: BuilderConfig::default(),
            keys: KeysConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl GenesisConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GenesisError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| GenesisError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Like [`GenesisConfig::load`] but a missing file means defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let config = Self::load(path)?;
            info!("Config loaded from {}", path.display());
            Ok(config)
        } else {
            info!("Config file not found at '{}'. Using defaults.", path.display());
            Ok(Self::default())
        }
    }
}
