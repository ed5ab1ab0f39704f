//! # Register Configuration
//!
//! Per-terminal settings: identity, currency display, catalog location, split
//! defaults and log level.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DREAMPOS_TERMINAL_NAME="Front Desk"                                │
//! │     DREAMPOS_SPLIT_PAYERS=4                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/register/register.toml (Linux)                           │
//! │     ~/Library/Application Support/com.dreampos.register/ (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, 2 payers, auto-generated terminal id                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [terminal]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Front Desk"
//!
//! [currency]
//! code = "EUR"
//! symbol = "€"
//! decimals = 2
//! placement = "suffix"
//! decimal_separator = ","
//!
//! [catalog]
//! path = "/srv/dreampos/catalog.json"
//!
//! [split]
//! default_payer_count = 2
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use dreampos_core::{MAX_PAYERS, MIN_PAYERS};

use crate::error::{RegisterError, RegisterResult};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "DREAMPOS_CONFIG";

/// Most fraction digits a currency can be displayed with.
pub const MAX_CURRENCY_DECIMALS: u8 = 4;

// =============================================================================
// Terminal
// =============================================================================

/// Identity of this register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Auto-generated on first run if not provided.
    #[serde(default = "default_terminal_id")]
    pub id: String,

    /// Human-readable name (e.g., "Front Desk", "Bar").
    #[serde(default = "default_terminal_name")]
    pub name: String,
}

fn default_terminal_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_terminal_name() -> String {
    "Register".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            id: default_terminal_id(),
            name: default_terminal_name(),
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Which side of the amount the symbol goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPlacement {
    /// `$12.34`
    #[default]
    Prefix,
    /// `12,34 €`
    Suffix,
}

impl std::fmt::Display for SymbolPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolPlacement::Prefix => write!(f, "prefix"),
            SymbolPlacement::Suffix => write!(f, "suffix"),
        }
    }
}

impl std::str::FromStr for SymbolPlacement {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefix" | "before" => Ok(SymbolPlacement::Prefix),
            "suffix" | "after" => Ok(SymbolPlacement::Suffix),
            other => Err(RegisterError::InvalidConfig(format!(
                "Unknown symbol placement: '{}'. Valid options: prefix, suffix",
                other
            ))),
        }
    }
}

/// How amounts are shown to people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// ISO 4217 code
    #[serde(default = "default_currency_code")]
    pub code: String,

    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    /// Fraction digits; amounts are always stored in the minor unit.
    #[serde(default = "default_currency_decimals")]
    pub decimals: u8,

    #[serde(default)]
    pub placement: SymbolPlacement,

    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

fn default_currency_code() -> String {
    "USD".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_currency_decimals() -> u8 {
    2
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

impl CurrencyConfig {
    pub fn validate(&self) -> RegisterResult<()> {
        if self.decimals > MAX_CURRENCY_DECIMALS {
            return Err(RegisterError::InvalidConfig(format!(
                "currency.decimals must be at most {}, got {}",
                MAX_CURRENCY_DECIMALS, self.decimals
            )));
        }

        if self.decimals > 0 && self.decimal_separator.is_empty() {
            return Err(RegisterError::InvalidConfig(
                "currency.decimal_separator must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
            decimals: default_currency_decimals(),
            placement: SymbolPlacement::default(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

// =============================================================================
// Catalog, Split, Logging
// =============================================================================

/// Where the product catalog comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON array of products. None means the caller supplies the catalog.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Payers a new split starts with.
    #[serde(default = "default_payer_count")]
    pub default_payer_count: usize,
}

fn default_payer_count() -> usize {
    dreampos_core::DEFAULT_PAYER_COUNT
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            default_payer_count: default_payer_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file: `config_path`, else `$DREAMPOS_CONFIG`, else the
    ///    platform config directory
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RegisterResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading register config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses one TOML file, no env overrides.
    pub fn from_file(path: &Path) -> RegisterResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file as pretty TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> RegisterResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RegisterError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RegisterError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| RegisterError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Register config saved");
        Ok(path)
    }

    pub fn validate(&self) -> RegisterResult<()> {
        if self.terminal.id.trim().is_empty() {
            return Err(RegisterError::InvalidConfig("terminal.id must not be empty".into()));
        }

        self.currency.validate()?;

        let payers = self.split.default_payer_count;
        if !(MIN_PAYERS..=MAX_PAYERS).contains(&payers) {
            return Err(RegisterError::InvalidConfig(format!(
                "split.default_payer_count must be between {} and {}, got {}",
                MIN_PAYERS, MAX_PAYERS, payers
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(RegisterError::InvalidConfig("logging.level must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `DREAMPOS_*` overrides read through `lookup`.
    ///
    /// Unparseable numeric values are logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("DREAMPOS_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal id from environment");
            self.terminal.id = id;
        }

        if let Some(name) = lookup("DREAMPOS_TERMINAL_NAME") {
            self.terminal.name = name;
        }

        if let Some(code) = lookup("DREAMPOS_CURRENCY_CODE") {
            self.currency.code = code;
        }

        if let Some(symbol) = lookup("DREAMPOS_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Some(decimals) = lookup("DREAMPOS_CURRENCY_DECIMALS") {
            match decimals.parse::<u8>() {
                Ok(d) => self.currency.decimals = d,
                Err(_) => warn!(value = %decimals, "Ignoring invalid DREAMPOS_CURRENCY_DECIMALS"),
            }
        }

        if let Some(placement) = lookup("DREAMPOS_CURRENCY_PLACEMENT") {
            match placement.parse() {
                Ok(p) => self.currency.placement = p,
                Err(e) => warn!(error = %e, "Ignoring invalid DREAMPOS_CURRENCY_PLACEMENT"),
            }
        }

        if let Some(path) = lookup("DREAMPOS_CATALOG_PATH") {
            debug!(path = %path, "Overriding catalog path from environment");
            self.catalog.path = Some(PathBuf::from(path));
        }

        if let Some(payers) = lookup("DREAMPOS_SPLIT_PAYERS") {
            match payers.parse::<usize>() {
                Ok(n) => self.split.default_payer_count = n,
                Err(_) => warn!(value = %payers, "Ignoring invalid DREAMPOS_SPLIT_PAYERS"),
            }
        }

        if let Some(level) = lookup("DREAMPOS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// `register.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "dreampos", "register")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert!(!config.terminal.id.is_empty());
        assert_eq!(config.currency.code, "USD");
        assert_eq!(config.currency.decimals, 2);
        assert_eq!(config.split.default_payer_count, 2);
        assert!(config.catalog.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RegisterConfig = toml::from_str(
            r#"
            [currency]
            symbol = "€"
            placement = "suffix"
            decimal_separator = ","
            "#,
        )
        .unwrap();

        assert_eq!(config.currency.symbol, "€");
        assert_eq!(config.currency.placement, SymbolPlacement::Suffix);
        assert_eq!(config.currency.code, "USD");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let mut config = RegisterConfig::default();

        config.split.default_payer_count = 1;
        assert!(config.validate().is_err());
        config.split.default_payer_count = MAX_PAYERS;
        assert!(config.validate().is_ok());

        config.currency.decimals = 9;
        assert!(config.validate().is_err());
        config.currency.decimals = 0;
        config.currency.decimal_separator = String::new();
        assert!(config.validate().is_ok());

        config.terminal.id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("DREAMPOS_TERMINAL_NAME", "Bar"),
            ("DREAMPOS_CURRENCY_DECIMALS", "0"),
            ("DREAMPOS_CURRENCY_PLACEMENT", "after"),
            ("DREAMPOS_SPLIT_PAYERS", "not-a-number"),
            ("DREAMPOS_CATALOG_PATH", "/tmp/catalog.json"),
        ]
        .into_iter()
        .collect();

        let mut config = RegisterConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.terminal.name, "Bar");
        assert_eq!(config.currency.decimals, 0);
        assert_eq!(config.currency.placement, SymbolPlacement::Suffix);
        assert_eq!(config.split.default_payer_count, 2);
        assert_eq!(config.catalog.path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        // save() creates missing parent directories
        let path = dir.path().join("terminal").join("register.toml");
        let mut config = RegisterConfig::default();
        config.terminal.name = "Patio".to_string();
        config.split.default_payer_count = 3;

        let written = config.save(Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let loaded = RegisterConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_toml_serialization() {
        let config = RegisterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[terminal]"));
        assert!(toml_str.contains("[currency]"));
        assert!(toml_str.contains("[split]"));
    }

    #[test]
    fn test_bad_file_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[split\ndefault_payer_count = ").unwrap();

        assert!(matches!(
            RegisterConfig::from_file(&path),
            Err(RegisterError::ConfigLoadFailed(_))
        ));
    }

    #[test]
    fn test_placement_parsing() {
        assert_eq!("prefix".parse::<SymbolPlacement>().unwrap(), SymbolPlacement::Prefix);
        assert_eq!("Suffix".parse::<SymbolPlacement>().unwrap(), SymbolPlacement::Suffix);
        assert!("middle".parse::<SymbolPlacement>().is_err());
    }
}
