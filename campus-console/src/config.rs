//! Configuration loading for the console.
//!
//! Loads configuration from TOML files and/or environment variables using figment.
//!
//! # Configuration Sources (in order of priority, lowest to highest)
//!
//! 1. Default values (from `#[serde(default)]` attributes)
//! 2. TOML config file (if it exists)
//! 3. Environment variables (prefix: `CAMPUS_`, nested with `__`)
//!
//! # Environment Variable Naming
//!
//! - `CAMPUS_SERVER__LISTEN_ADDR` → `server.listen_addr`
//! - `CAMPUS_API__BASE_URL` → `api.base_url`
//! - `CAMPUS_API__SEND_PLACEHOLDER_BEARER` → `api.send_placeholder_bearer`
//! - `CAMPUS_SESSION__SECURE_COOKIES` → `session.secure_cookies`
//! - `CAMPUS_UI__NOTICE_AUTOHIDE_MS` → `ui.notice_autohide_ms`

use anyhow::{Context, Result};
use campus_api::ClientFactory;
use campus_api::client::DEFAULT_BASE_URL;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the console.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session cookie settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Presentation settings
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Send `Authorization: Bearer null` when there is no session.
    ///
    /// Some backend deployments expect the header on every request. Set to
    /// `false` to omit it for anonymous requests instead.
    #[serde(default = "default_true")]
    pub send_placeholder_bearer: bool,

    /// Request timeout in seconds. Unset means the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            send_placeholder_bearer: true,
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl ApiConfig {
    /// Build the client factory for this backend.
    pub fn client_factory(&self) -> Result<ClientFactory> {
        ClientFactory::builder(self.base_url.as_str())
            .send_placeholder_bearer(self.send_placeholder_bearer)
            .timeout(self.timeout_secs.map(Duration::from_secs))
            .user_agent(concat!("campus-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Mark session cookies `Secure` (enable when served over HTTPS).
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// How long a notification stays up before dismissing itself.
    #[serde(default = "default_notice_autohide_ms")]
    pub notice_autohide_ms: u64,

    /// Currency label shown before course prices.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Where a freshly signed-up student lands.
    #[serde(default = "default_signup_landing")]
    pub signup_landing: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_autohide_ms: default_notice_autohide_ms(),
            currency: default_currency(),
            signup_landing: default_signup_landing(),
        }
    }
}

fn default_notice_autohide_ms() -> u64 {
    3000
}

fn default_currency() -> String {
    "LKR".to_string()
}

fn default_signup_landing() -> String {
    "/courses".to_string()
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    ///
    /// A missing file is not an error: every field has a default.
    ///
    /// ```bash
    /// export CAMPUS_API__BASE_URL=https://campus.example.com/api/
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let mut figment = Figment::new();

        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("CAMPUS_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load config from {} and environment", path.display()))?;

        Ok(config)
    }

    /// Get the default config file path
    /// - macOS: ~/Library/Application Support/campus-console/config.toml
    /// - Linux: ~/.config/campus-console/config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus-console")
            .join("config.toml")
    }

    /// Get the default data directory (logs)
    /// - macOS: ~/Library/Application Support/campus-console/
    /// - Linux: ~/.local/share/campus-console/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus-console")
    }
}

/// Create a default configuration template
pub fn default_config_template() -> String {
    format!(
        r#"# Campus Console Configuration

[server]
listen_addr = "{listen}"

[api]
# Every backend endpoint is resolved relative to this URL.
base_url = "{base_url}"
# Anonymous requests carry `Authorization: Bearer null` unless disabled.
send_placeholder_bearer = true
# timeout_secs = 30

[session]
# Enable when the console is served over HTTPS.
secure_cookies = false

[ui]
notice_autohide_ms = {autohide}
currency = "{currency}"
signup_landing = "{landing}"
"#,
        listen = default_listen_addr(),
        base_url = DEFAULT_BASE_URL,
        autohide = default_notice_autohide_ms(),
        currency = default_currency(),
        landing = default_signup_landing(),
    )
}
