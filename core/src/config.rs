//! Pipeline configuration.
//!
//! Loaded from environment variables with sensible defaults, then validated.
//!
//! # Example
//!
//! ```no_run
//! use pipeline_core::config::PipelineConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_env()?;
//! println!("production profile: {}", config.is_production());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid environment name.
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
    /// A variable could not be parsed.
    #[error("Failed to parse {var}: {value:?}")]
    Parse {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
    },
    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Pre-production.
    Staging,
    /// Production profile: error details and internal messages are hidden.
    Production,
}

impl Environment {
    /// Check if this is the production profile.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Per-key request throttling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Whether the throttle layer is installed.
    pub enabled: bool,
    /// Tokens refilled per second.
    pub rate: f64,
    /// Bucket capacity.
    pub burst: u32,
    /// Period of the full-clear sweep, in seconds.
    pub sweep_interval_secs: u64,
}

impl ThrottleConfig {
    /// Sweep period as a `Duration`.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: 10.0,
            burst: 20,
            sweep_interval_secs: 3 * 60 * 60,
        }
    }
}

/// Failed-attempt limiting (brute-force guard).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptConfig {
    /// Failures allowed before the key is blocked.
    pub limit: u32,
    /// Block duration, in seconds.
    pub interval_secs: u64,
    /// Error message; `{minutes}` is replaced with the block duration.
    pub message: String,
    /// Period of the maturity sweep, in seconds.
    pub sweep_interval_secs: u64,
}

impl AttemptConfig {
    /// Block duration as a `Duration`.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Sweep period as a `Duration`.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            limit: 3,
            interval_secs: 5 * 60,
            message: "Too many failed attempts, try again in {minutes} minutes".to_string(),
            sweep_interval_secs: 3 * 60 * 60,
        }
    }
}

/// Request security checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Verify the `sgn` request signature.
    pub validate_signature: bool,
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Deployment environment.
    pub environment: Environment,
    /// Application name, mixed into request signatures.
    pub app_name: String,
    /// Language used when the caller sends none.
    pub default_lang: String,
    /// Throttling.
    pub throttle: ThrottleConfig,
    /// Attempt limiting.
    pub attempts: AttemptConfig,
    /// Security checks.
    pub security: SecurityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            app_name: "pipeline".to_string(),
            default_lang: "en".to_string(),
            throttle: ThrottleConfig::default(),
            attempts: AttemptConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from `PIPELINE_*` environment variables over the defaults, then
    /// validate.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup("PIPELINE_ENV") {
            config.environment = env.parse()?;
        }
        if let Some(name) = lookup("PIPELINE_APP_NAME") {
            config.app_name = name;
        }
        if let Some(lang) = lookup("PIPELINE_DEFAULT_LANG") {
            config.default_lang = lang;
        }
        if let Some(v) = lookup("PIPELINE_THROTTLE_ENABLED") {
            config.throttle.enabled = parse_var("PIPELINE_THROTTLE_ENABLED", &v)?;
        }
        if let Some(v) = lookup("PIPELINE_RATE") {
            config.throttle.rate = parse_var("PIPELINE_RATE", &v)?;
        }
        if let Some(v) = lookup("PIPELINE_BURST") {
            config.throttle.burst = parse_var("PIPELINE_BURST", &v)?;
        }
        if let Some(v) = lookup("PIPELINE_ATTEMPT_LIMIT") {
            config.attempts.limit = parse_var("PIPELINE_ATTEMPT_LIMIT", &v)?;
        }
        if let Some(v) = lookup("PIPELINE_ATTEMPT_INTERVAL_SECS") {
            config.attempts.interval_secs = parse_var("PIPELINE_ATTEMPT_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("PIPELINE_VALIDATE_SIGNATURE") {
            config.security.validate_signature = parse_var("PIPELINE_VALIDATE_SIGNATURE", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.throttle.rate.is_finite() || self.throttle.rate <= 0.0 {
            return Err(ConfigError::Validation(
                "throttle.rate must be a finite number > 0".to_string(),
            ));
        }
        if self.throttle.burst == 0 {
            return Err(ConfigError::Validation("throttle.burst must be > 0".to_string()));
        }
        if self.throttle.sweep_interval_secs == 0 || self.attempts.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "sweep intervals must be > 0".to_string(),
            ));
        }
        if self.attempts.limit == 0 {
            return Err(ConfigError::Validation("attempts.limit must be > 0".to_string()));
        }
        if self.attempts.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "attempts.interval_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the production profile is active.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

fn parse_var<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        var: var.to_string(),
        value: value.to_string(),
    })
}
