//! Configuration management
//!
//! This module handles loading and parsing configuration for the site server.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Public site identity
    #[serde(default)]
    pub site: SiteConfig,
    /// Headless CMS connection
    #[serde(default)]
    pub cms: CmsConfig,
    /// AI provider settings
    #[serde(default)]
    pub ai: AiConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the CMS editing console)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:3333".to_string()
}

/// Public site identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in titles and structured data
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Site tagline
    #[serde(default = "default_site_description")]
    pub description: String,
    /// Absolute base URL, without trailing slash
    #[serde(default = "default_site_url")]
    pub url: String,
    /// `max-age` sent with rendered pages, in seconds
    #[serde(default = "default_revalidate_seconds")]
    pub revalidate_seconds: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            description: default_site_description(),
            url: default_site_url(),
            revalidate_seconds: default_revalidate_seconds(),
        }
    }
}

fn default_site_name() -> String {
    "Almas Enraizadas".to_string()
}

fn default_site_description() -> String {
    "Un espacio de bienestar, mindfulness y crecimiento personal. Raíces profundas para una vida plena."
        .to_string()
}

fn default_site_url() -> String {
    "https://almazasenraizadas.com".to_string()
}

fn default_revalidate_seconds() -> u64 {
    60
}

/// Headless CMS (Sanity) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Project identifier; empty means the CMS is not configured
    #[serde(default)]
    pub project_id: String,
    /// Dataset name
    #[serde(default = "default_dataset")]
    pub dataset: String,
    /// Query API version (date string)
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Query the CDN-backed API host
    #[serde(default)]
    pub use_cdn: bool,
    /// Optional read token for private datasets
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: default_dataset(),
            api_version: default_api_version(),
            use_cdn: false,
            token: None,
        }
    }
}

impl CmsConfig {
    /// Whether a project is configured
    pub fn is_configured(&self) -> bool {
        !self.project_id.trim().is_empty()
    }
}

fn default_dataset() -> String {
    "production".to_string()
}

fn default_api_version() -> String {
    "2024-01-01".to_string()
}

/// AI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key; usually provided through `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    /// API base URL
    #[serde(default = "default_ai_api_base")]
    pub api_base: String,
    /// Chat completion model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Image generation model
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Generated image size
    #[serde(default = "default_image_size")]
    pub image_size: String,
    /// Generated image quality
    #[serde(default = "default_image_quality")]
    pub image_quality: String,
    /// Sampling temperature for text generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum completion tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Outbound request timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_ai_api_base(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            image_size: default_image_size(),
            image_quality: default_image_quality(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_ai_timeout(),
        }
    }
}

impl AiConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_ai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1792x1024".to_string()
}

fn default_image_quality() -> String {
    "standard".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_ai_timeout() -> u64 {
    60
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache CMS query results
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl() -> u64 {
    60
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Theme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Active theme name (a directory of template overrides)
    #[serde(default = "default_theme")]
    pub active: String,
    /// Path to themes directory
    #[serde(default = "default_theme_path")]
    pub path: PathBuf,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            active: default_theme(),
            path: default_theme_path(),
        }
    }
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("themes")
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - ALMAS_SERVER_HOST, ALMAS_SERVER_PORT, ALMAS_SERVER_CORS_ORIGIN
    /// - ALMAS_SITE_URL
    /// - ALMAS_SANITY_PROJECT_ID, ALMAS_SANITY_DATASET, ALMAS_SANITY_API_VERSION,
    ///   ALMAS_SANITY_USE_CDN, ALMAS_SANITY_TOKEN
    /// - ALMAS_CACHE_TTL_SECONDS
    /// - ALMAS_THEME_ACTIVE, ALMAS_THEME_PATH
    /// - OPENAI_API_KEY
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce broken URLs downstream
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.site.url.starts_with("http://") || self.site.url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "site.url must be an absolute http(s) URL, got '{}'",
                self.site.url
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("ALMAS_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ALMAS_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("ALMAS_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(url) = std::env::var("ALMAS_SITE_URL") {
            self.site.url = url.trim_end_matches('/').to_string();
        }

        if let Ok(project_id) = std::env::var("ALMAS_SANITY_PROJECT_ID") {
            self.cms.project_id = project_id;
        }
        if let Ok(dataset) = std::env::var("ALMAS_SANITY_DATASET") {
            self.cms.dataset = dataset;
        }
        if let Ok(api_version) = std::env::var("ALMAS_SANITY_API_VERSION") {
            self.cms.api_version = api_version;
        }
        if let Ok(use_cdn) = std::env::var("ALMAS_SANITY_USE_CDN") {
            if let Ok(use_cdn) = use_cdn.parse::<bool>() {
                self.cms.use_cdn = use_cdn;
            }
        }
        if let Ok(token) = std::env::var("ALMAS_SANITY_TOKEN") {
            self.cms.token = Some(token);
        }

        if let Ok(ttl) = std::env::var("ALMAS_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(active) = std::env::var("ALMAS_THEME_ACTIVE") {
            self.theme.active = active;
        }
        if let Ok(path) = std::env::var("ALMAS_THEME_PATH") {
            self.theme.path = PathBuf::from(path);
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.ai.api_key = Some(key);
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "ALMAS_SERVER_HOST",
    "ALMAS_SERVER_PORT",
    "ALMAS_SERVER_CORS_ORIGIN",
    "ALMAS_SITE_URL",
    "ALMAS_SANITY_PROJECT_ID",
    "ALMAS_SANITY_DATASET",
    "ALMAS_SANITY_API_VERSION",
    "ALMAS_SANITY_USE_CDN",
    "ALMAS_SANITY_TOKEN",
    "ALMAS_CACHE_TTL_SECONDS",
    "ALMAS_THEME_ACTIVE",
    "ALMAS_THEME_PATH",
    "OPENAI_API_KEY",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn valid_port_strategy() -> impl Strategy<Value = u16> {
        1024u16..=65535u16
    }

    fn valid_dataset_strategy() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,15}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn config_yaml_roundtrip(port in valid_port_strategy(), dataset in valid_dataset_strategy(), ttl in 1u64..86400) {
            let mut config = Config::default();
            config.server.port = port;
            config.cms.dataset = dataset.clone();
            config.cache.ttl_seconds = ttl;

            let yaml = serde_yaml::to_string(&config).unwrap();
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "{}", yaml).unwrap();

            let loaded = Config::load(file.path()).unwrap();
            prop_assert_eq!(loaded.server.port, port);
            prop_assert_eq!(loaded.cms.dataset, dataset);
            prop_assert_eq!(loaded.cache.ttl_seconds, ttl);
        }

        #[test]
        fn env_port_takes_precedence_over_file(file_port in valid_port_strategy(), env_port in valid_port_strategy()) {
            let _guard = lock_env();
            super::clear_env();

            let mut file = NamedTempFile::new().unwrap();
            write!(file, "server:\n  port: {}\n", file_port).unwrap();
            std::env::set_var("ALMAS_SERVER_PORT", env_port.to_string());

            let config = Config::load_with_env(file.path()).unwrap();
            super::clear_env();

            prop_assert_eq!(config.server.port, env_port);
        }
    }
}
