//! Configuration management for `Tripsmith`
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates every setting before the orchestrator is built.

use crate::TripError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripConfig {
    /// Provider endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Retry, deadline and synthesis timing
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Narrative synthesis backend
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    /// Plan cache
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

/// One provider backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Empty falls back to the provider's local default
    #[serde(default)]
    pub base_url: String,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

impl ProviderEndpoint {
    fn local(port: u16) -> Self {
        Self {
            base_url: format!("http://localhost:{port}"),
            timeout_ms: default_provider_timeout_ms(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_weather_endpoint")]
    pub weather: ProviderEndpoint,
    #[serde(default = "default_insights_endpoint")]
    pub insights: ProviderEndpoint,
    #[serde(default = "default_booking_endpoint")]
    pub booking: ProviderEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Retries after the first attempt, for transient failures only
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Overrides the deadline derived from provider timeouts
    #[serde(default)]
    pub global_deadline_ms: Option<u64>,
    /// Fail with a timeout error instead of returning a partial plan
    #[serde(default)]
    pub strict_deadline: bool,
    #[serde(default = "default_synthesis_timeout_ms")]
    pub synthesis_timeout_ms: u64,
}

/// OpenAI-compatible chat completion backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_synthesis_base_url")]
    pub base_url: String,
    #[serde(default = "default_synthesis_model")]
    pub model: String,
    /// Inline key; prefer `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// TTL of complete plans in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// TTL of partial plans in seconds
    #[serde(default = "default_partial_ttl_secs")]
    pub partial_ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request timeout for the HTTP layer in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_provider_timeout_ms() -> u64 {
    5_000
}

fn default_weather_endpoint() -> ProviderEndpoint {
    ProviderEndpoint::local(3001)
}

fn default_insights_endpoint() -> ProviderEndpoint {
    ProviderEndpoint::local(3002)
}

fn default_booking_endpoint() -> ProviderEndpoint {
    ProviderEndpoint::local(3003)
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    2_000
}

fn default_synthesis_timeout_ms() -> u64 {
    20_000
}

fn default_synthesis_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_synthesis_model() -> String {
    "gpt-4".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2_000
}

fn default_cache_ttl_secs() -> u64 {
    30 * 60
}

fn default_partial_ttl_secs() -> u64 {
    60
}

fn default_max_entries() -> usize {
    1_024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            weather: default_weather_endpoint(),
            insights: default_insights_endpoint(),
            booking: default_booking_endpoint(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            global_deadline_ms: None,
            strict_deadline: false,
            synthesis_timeout_ms: default_synthesis_timeout_ms(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_synthesis_base_url(),
            model: default_synthesis_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl SynthesisConfig {
    /// Inline key if set, otherwise the key from `api_key_env`
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
            partial_ttl_secs: default_partial_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl TripConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPSMITH_CACHE__TTL_SECS=600 overrides cache.ttl_secs
        builder = builder.add_source(
            Environment::with_prefix("TRIPSMITH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripsmith").join("config.toml"))
    }

    /// Replace zero or empty values with defaults
    pub fn apply_defaults(&mut self) {
        for (endpoint, fallback) in [
            (&mut self.providers.weather, default_weather_endpoint()),
            (&mut self.providers.insights, default_insights_endpoint()),
            (&mut self.providers.booking, default_booking_endpoint()),
        ] {
            if endpoint.base_url.is_empty() {
                endpoint.base_url = fallback.base_url;
            }
            if endpoint.timeout_ms == 0 {
                endpoint.timeout_ms = default_provider_timeout_ms();
            }
        }
        if self.orchestrator.backoff_base_ms == 0 {
            self.orchestrator.backoff_base_ms = default_backoff_base_ms();
        }
        if self.orchestrator.backoff_max_ms == 0 {
            self.orchestrator.backoff_max_ms = default_backoff_max_ms();
        }
        if self.orchestrator.synthesis_timeout_ms == 0 {
            self.orchestrator.synthesis_timeout_ms = default_synthesis_timeout_ms();
        }
        if self.synthesis.base_url.is_empty() {
            self.synthesis.base_url = default_synthesis_base_url();
        }
        if self.synthesis.model.is_empty() {
            self.synthesis.model = default_synthesis_model();
        }
        if self.synthesis.max_tokens == 0 {
            self.synthesis.max_tokens = default_max_tokens();
        }
        if self.cache.ttl_secs == 0 {
            self.cache.ttl_secs = default_cache_ttl_secs();
        }
        if self.cache.max_entries == 0 {
            self.cache.max_entries = default_max_entries();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.request_timeout_secs == 0 {
            self.server.request_timeout_secs = default_request_timeout_secs();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, endpoint) in self.provider_endpoints() {
            if endpoint.timeout_ms > 120_000 {
                return Err(TripError::config(format!(
                    "{name} provider timeout cannot exceed 120000 ms"
                ))
                .into());
            }
        }

        let orchestrator = &self.orchestrator;
        if orchestrator.max_retries > 5 {
            return Err(TripError::config("Max retries cannot exceed 5").into());
        }
        if orchestrator.backoff_base_ms > orchestrator.backoff_max_ms {
            return Err(TripError::config("Backoff base cannot exceed backoff max").into());
        }
        if orchestrator.global_deadline_ms == Some(0) {
            return Err(TripError::config("Global deadline must be positive when set").into());
        }
        if orchestrator.synthesis_timeout_ms > 300_000 {
            return Err(TripError::config("Synthesis timeout cannot exceed 300000 ms").into());
        }

        if !(0.0..=2.0).contains(&self.synthesis.temperature) {
            return Err(TripError::config("Synthesis temperature must be between 0 and 2").into());
        }
        if self.synthesis.max_tokens > 32_000 {
            return Err(TripError::config("Synthesis max tokens cannot exceed 32000").into());
        }

        if self.cache.ttl_secs > 7 * 24 * 60 * 60 {
            return Err(TripError::config("Cache TTL cannot exceed one week").into());
        }
        if self.cache.partial_ttl_secs > self.cache.ttl_secs {
            return Err(TripError::config("Partial plan TTL cannot exceed the cache TTL").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = self
            .provider_endpoints()
            .map(|(name, endpoint)| (name, endpoint.base_url.as_str()))
            .into_iter()
            .chain([("synthesis", self.synthesis.base_url.as_str())]);
        for (name, url) in urls {
            if !is_http_url(url) {
                return Err(TripError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn provider_endpoints(&self) -> [(&'static str, &ProviderEndpoint); 3] {
        [
            ("weather", &self.providers.weather),
            ("insights", &self.providers.insights),
            ("booking", &self.providers.booking),
        ]
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
