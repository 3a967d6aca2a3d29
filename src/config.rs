use crate::error::{ConfigError, Result, SpotctlError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub pricing: PricingConfig,
    pub retry: RetryConfig,
    /// Launch profiles by name
    pub profiles: BTreeMap<String, LaunchProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region override (SDK default chain when unset)
    pub region: Option<String>,
    /// Named credentials profile from ~/.aws/config
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Price history window used by `prices history` and `prices recommend`
    pub lookback_hours: u32,
    /// Zones fetched concurrently
    pub max_zone_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Launch specification for spot requests, selected by name on the command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchProfile {
    pub instance_type: String,
    /// Product description used for price lookups, e.g. "Linux/UNIX"
    pub product: String,
    pub image_id: String,
    pub key_name: Option<String>,
    pub security_group_name: Option<String>,
    pub security_group_id: Option<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 48,
            max_zone_requests: 8,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Config {
    /// Config written by `spotctl init`
    pub fn example() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "default".to_string(),
            LaunchProfile {
                instance_type: "c5.xlarge".to_string(),
                product: "Linux/UNIX".to_string(),
                image_id: "ami-08fa3ed5577079e64".to_string(), // Amazon Linux 2023
                key_name: None,
                security_group_name: None,
                security_group_id: None,
            },
        );
        Self {
            aws: AwsConfig {
                region: Some("us-east-1".to_string()),
                profile: None,
            },
            profiles,
            ..Self::default()
        }
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .spotctl.toml in current dir, then ~/.config/spotctl/config.toml
            let local = PathBuf::from(".spotctl.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("spotctl").join("config.toml"))
                    .unwrap_or(local)
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config = Self::from_toml(&content)
                .with_context(|| {
                    let mut err = format!("Failed to load config: {}", config_path.display());
                    err.push_str("\n  Tip: Run 'spotctl init' to create a new config file");
                    err
                })?;
            Ok(config)
        } else {
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!("   Using default configuration. Run 'spotctl init' to create a config file.");
            }
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pricing.lookback_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pricing.lookback_hours".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        for (name, profile) in &self.profiles {
            let required = [
                ("instance_type", &profile.instance_type),
                ("product", &profile.product),
                ("image_id", &profile.image_id),
            ];
            for (field, value) in required {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingField(format!("profiles.{}.{}", name, field)).into());
                }
            }
        }
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Result<&LaunchProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| SpotctlError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

pub fn init_config(output: &Path) -> anyhow::Result<()> {
    if output.exists() {
        anyhow::bail!("Config file already exists: {}", output.display());
    }
    Config::example().save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}
