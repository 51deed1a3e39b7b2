//! Configuration loading for forkcastd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.forkcast/config.toml` (user)
//! 3. `/etc/forkcast/config.toml` (system)
//!
//! When no file exists the defaults are used.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.forkcast/secrets.toml` (user, must be 0600)
//! 2. `/etc/forkcast/secrets.toml` (system, must be 0600)
//!
//! Environment variables override both (see [`Config::apply_overrides`]).

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::catalog::DEFAULT_LOCALE;
use crate::features::FeatureFlags;
use crate::providers::{ipapi, nominatim, open_meteo, recaptcha};
use crate::store::RedisSettings;
use crate::types::{DEFAULT_MODEL_CONFIG, ModelConfig};
use crate::{ForkcastError, Result};

/// Environment variable holding the verification secret.
pub const RECAPTCHA_SECRET_ENV: &str = "RECAPTCHA_SECRET_KEY";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default = "default_models")]
    pub models: HashMap<String, ModelConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub locale: LocaleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis: RedisSettings::default(),
            cache: CacheConfig::default(),
            features: FeatureFlags::default(),
            models: default_models(),
            providers: ProvidersConfig::default(),
            verification: VerificationConfig::default(),
            locale: LocaleConfig::default(),
        }
    }
}

fn default_models() -> HashMap<String, ModelConfig> {
    HashMap::from([(DEFAULT_MODEL_CONFIG.to_string(), ModelConfig::default())])
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000).
    #[serde(default = "default_address")]
    pub address: String,
    /// Request timeout in seconds (default: 90).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Model configuration used for food completions.
    #[serde(default = "default_model_config")]
    pub model_config: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            request_timeout_secs: default_request_timeout(),
            model_config: default_model_config(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_request_timeout() -> u64 {
    90
}

fn default_model_config() -> String {
    DEFAULT_MODEL_CONFIG.to_string()
}

/// Which store backs the response cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Entry limit for the in-memory backend (default: 10000).
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

fn default_memory_capacity() -> u64 {
    10_000
}

/// Upstream provider endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    #[serde(default = "default_ipapi_url")]
    pub ipapi_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Timeout for weather, geocoding and verification calls (default: 15).
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            open_meteo_url: default_open_meteo_url(),
            nominatim_url: default_nominatim_url(),
            ipapi_url: default_ipapi_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_open_meteo_url() -> String {
    open_meteo::DEFAULT_BASE_URL.to_string()
}

fn default_nominatim_url() -> String {
    nominatim::DEFAULT_BASE_URL.to_string()
}

fn default_ipapi_url() -> String {
    ipapi::DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    crate::providers::DEFAULT_USER_AGENT.to_string()
}

fn default_provider_timeout() -> u64 {
    crate::providers::DEFAULT_TIMEOUT.as_secs()
}

/// Human verification settings.
#[derive(Clone, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Falls back to the secrets file, then `RECAPTCHA_SECRET_KEY`.
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            verify_url: default_verify_url(),
            min_score: default_min_score(),
            secret_key: None,
        }
    }
}

impl std::fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("verify_url", &self.verify_url)
            .field("min_score", &self.min_score)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .finish()
    }
}

fn default_verify_url() -> String {
    recaptcha::DEFAULT_VERIFY_URL.to_string()
}

fn default_min_score() -> f64 {
    recaptcha::DEFAULT_MIN_SCORE
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Catalog of last resort, and the food-details locale when none is sent.
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
        }
    }
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    /// Keyed by model configuration name.
    #[serde(default)]
    pub models: HashMap<String, ApiKeySecret>,
    #[serde(default)]
    pub recaptcha: Option<RecaptchaSecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecaptchaSecret {
    pub secret_key: String,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided, must exist)
    /// 2. `~/.forkcast/config.toml`
    /// 3. `/etc/forkcast/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            info!("no config file found, using defaults");
            return Ok(Self::default());
        };
        let config = Self::load_from_file(&path)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ForkcastError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ForkcastError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(ForkcastError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".forkcast").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/forkcast/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Check cross-section references.
    pub fn validate(&self) -> Result<()> {
        if !self.models.contains_key(&self.server.model_config) {
            return Err(ForkcastError::UnknownModelConfig(
                self.server.model_config.clone(),
            ));
        }
        Ok(())
    }

    /// Fill unset credentials from a secrets file.
    pub fn with_secrets(mut self, secrets: &Secrets) -> Self {
        for (name, model) in &mut self.models {
            if model.api_key.is_none() {
                model.api_key = secrets.models.get(name).map(|s| s.api_key.clone());
            }
        }
        if self.verification.secret_key.is_none() {
            self.verification.secret_key =
                secrets.recaptcha.as_ref().map(|s| s.secret_key.clone());
        }
        self
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// `REDIS_*` and `FORKCAST_FEATURE_*` always win over the file. Credentials
    /// (`<NAME>_API_KEY`, `RECAPTCHA_SECRET_KEY`) only fill values that are
    /// still unset.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.redis = self.redis.apply_overrides(&lookup);
        self.features = self.features.apply_overrides(&lookup);
        for (name, model) in &mut self.models {
            if model.api_key.is_none() {
                model.api_key = lookup(&ModelConfig::api_key_env(name));
            }
        }
        if self.verification.secret_key.is_none() {
            self.verification.secret_key = lookup(RECAPTCHA_SECRET_ENV);
        }
        self
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.forkcast/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/forkcast/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (credentials may come from env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".forkcast").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/forkcast/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ForkcastError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            ForkcastError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    pub fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            ForkcastError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(ForkcastError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:3000");
        assert_eq!(config.server.model_config, "openai");
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.models["openai"].max_concurrent_requests, 50);
        assert_eq!(config.redis.ready_timeout_secs, 15);
        assert_eq!(config.verification.min_score, 0.5);
        assert_eq!(config.locale.default_locale, "vi");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:8080"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
        // Defaults preserved
        assert_eq!(config.server.request_timeout_secs, 90);
        assert!(config.models.contains_key("openai"));
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            model_config = "gemini"

            [redis]
            host = "cache.internal"
            port = 6380
            db = 2

            [cache]
            backend = "memory"

            [features]
            mealTypeSelection = false

            [models.gemini]
            base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
            model = "gemini-2.0-flash"
            max_concurrent_requests = 4

            [providers]
            nominatim_url = "http://localhost:8088"

            [verification]
            min_score = 0.7
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.redis.port, 6380);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(!config.features.meal_type_selection);
        assert!(config.features.food_details);
        assert_eq!(config.models["gemini"].max_concurrent_requests, 4);
        assert_eq!(config.models["gemini"].max_attempts, 3);
        assert_eq!(config.providers.nominatim_url, "http://localhost:8088");
        assert_eq!(config.providers.ipapi_url, ipapi::DEFAULT_BASE_URL);
        assert_eq!(config.verification.min_score, 0.7);
    }

    #[test]
    fn unknown_model_config_is_rejected() {
        let config: Config = toml::from_str("[server]\nmodel_config = \"missing\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ForkcastError::UnknownModelConfig(name)) if name == "missing"
        ));
    }

    #[test]
    fn env_overrides_fill_credentials_and_flags() {
        let env = HashMap::from([
            ("OPENAI_API_KEY", "sk-env"),
            ("RECAPTCHA_SECRET_KEY", "captcha-env"),
            ("REDIS_HOST", "redis.example"),
            ("FORKCAST_FEATURE_ENABLE_CACHING", "false"),
        ]);
        let config =
            Config::default().apply_overrides(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.models["openai"].api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.verification.secret_key.as_deref(), Some("captcha-env"));
        assert_eq!(config.redis.host, "redis.example");
        assert!(!config.features.enable_caching);
    }

    #[test]
    fn secrets_take_precedence_over_env() {
        let secrets: Secrets = toml::from_str(
            r#"
            [models.openai]
            api_key = "sk-file"

            [recaptcha]
            secret_key = "captcha-file"
        "#,
        )
        .unwrap();
        let config = Config::default()
            .with_secrets(&secrets)
            .apply_overrides(|name| (name == "OPENAI_API_KEY").then(|| "sk-env".to_string()));
        assert_eq!(config.models["openai"].api_key.as_deref(), Some("sk-file"));
        assert_eq!(
            config.verification.secret_key.as_deref(),
            Some("captcha-file")
        );
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn debug_hides_secret() {
        let verification = VerificationConfig {
            secret_key: Some("captcha-secret".into()),
            ..Default::default()
        };
        assert!(!format!("{verification:?}").contains("captcha-secret"));
    }
}
