//! Client configuration file support.
//!
//! Settings are read from a `polaris.toml` file:
//!
//! ```toml
//! [client]
//! type = "http"
//!
//! [http]
//! base_url = "http://localhost:8084"
//! api_prefix = "/pst/api"
//! timeout_secs = 20
//!
//! [editor]
//! debounce_ms = 500
//! max_text_chars = 255
//! ```
//!
//! `POLARIS_CLIENT_TYPE`, `POLARIS_API_URL` and `POLARIS_API_TOKEN` override
//! the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::client::{ClientError, ClientType};
use crate::models::DEFAULT_TEXT_LIMIT;

/// Full client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: ClientSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub editor: EditorSettings,
}

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(rename = "type", default = "default_client_type")]
    pub client_type: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            client_type: default_client_type(),
        }
    }
}

/// REST backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_timeout_secs(),
            bearer_token: None,
        }
    }
}

/// Form and editor behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

impl EditorSettings {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_client_type() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8084".to_string()
}

fn default_api_prefix() -> String {
    "/pst/api".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_max_text_chars() -> usize {
    DEFAULT_TEXT_LIMIT
}

impl ClientConfig {
    /// Load client configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Err(ClientError::Configuration)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::configuration(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ClientError> {
        toml::from_str(content)
            .map_err(|e| ClientError::configuration(format!("Failed to parse config file: {}", e)))
    }

    /// Load client configuration from the default location.
    ///
    /// Searches for `polaris.toml` in:
    /// 1. Current directory
    /// 2. `config/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ClientError> {
        let search_paths = [
            PathBuf::from("polaris.toml"),
            PathBuf::from("config/polaris.toml"),
            PathBuf::from("../polaris.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ClientError::configuration(
            "No polaris.toml found in standard locations",
        ))
    }

    /// Apply `POLARIS_CLIENT_TYPE`, `POLARIS_API_URL` and `POLARIS_API_TOKEN`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(client_type) = std::env::var("POLARIS_CLIENT_TYPE") {
            self.client.client_type = client_type;
        }
        if let Ok(url) = std::env::var("POLARIS_API_URL") {
            self.http.base_url = url;
        }
        if let Ok(token) = std::env::var("POLARIS_API_TOKEN") {
            self.http.bearer_token = Some(token);
        }
        self
    }

    /// Get the client type from configuration.
    pub fn client_type(&self) -> Result<ClientType, String> {
        ClientType::from_str(&self.client.client_type)
    }
}
