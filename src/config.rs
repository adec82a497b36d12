use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default price cache TTL in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Default price cache capacity in entries
pub const DEFAULT_CACHE_MAX_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pricing: PricingConfig,
    pub cache: CacheConfig,
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// `static` or `live`; anything else is normalized to `static` per run
    pub mode: String,
    /// Inline JSON pricing table, highest priority
    pub json: Option<String>,
    /// Path to a JSON pricing table, used when `json` is unset
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Region hosting the Price List API endpoint
    pub pricing_region: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            mode: "static".to_string(),
            json: None,
            file: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_size: DEFAULT_CACHE_MAX_SIZE,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            // The Price List API is only served from a few regions
            pricing_region: "us-east-1".to_string(),
            connect_timeout_secs: 5,
            read_timeout_secs: 60,
            max_attempts: 10,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .wastectl.toml in current dir, then ~/.config/wastectl/config.toml
            let local = PathBuf::from(".wastectl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("wastectl").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".wastectl.toml"))
            }
        };

        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Unreadable {
                    path: config_path.display().to_string(),
                    reason: e.to_string(),
                })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                origin: config_path.display().to_string(),
                reason: format!("{}\n  Tip: Run 'wastectl init' to create a new config file", e),
            })?;
            Ok(config)
        } else {
            if path.is_some() {
                warn!(
                    "Config file not found: {}; using default configuration",
                    config_path.display()
                );
            }
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            origin: "config".to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay `PRICING_MODE`, `PRICING_JSON`, `PRICING_FILE`,
    /// `PRICE_CACHE_TTL_SECS` and `PRICE_CACHE_MAX_SIZE` from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::apply_env`] with an explicit variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("PRICING_MODE") {
            self.pricing.mode = mode;
        }
        if let Some(json) = lookup("PRICING_JSON").filter(|s| !s.is_empty()) {
            self.pricing.json = Some(json);
        }
        if let Some(file) = lookup("PRICING_FILE").filter(|s| !s.is_empty()) {
            self.pricing.file = Some(PathBuf::from(file));
        }
        if let Some(ttl) = lookup("PRICE_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_env_number("PRICE_CACHE_TTL_SECS", &ttl)?;
        }
        if let Some(size) = lookup("PRICE_CACHE_MAX_SIZE") {
            self.cache.max_size = parse_env_number("PRICE_CACHE_MAX_SIZE", &size)?;
        }
        Ok(())
    }

    /// Reject limits that would make the cache or the live source unusable
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be greater than zero"));
        }
        if self.cache.max_size == 0 {
            return Err(invalid("cache.max_size", "must be greater than zero"));
        }
        if self.live.max_attempts == 0 {
            return Err(invalid("live.max_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

fn parse_env_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| invalid(name, &format!("expected a non-negative integer, got '{}'", raw)))
}

fn invalid(field: &str, reason: &str) -> crate::error::WastectlError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
