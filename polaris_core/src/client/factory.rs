//! Client factory for dependency injection.
//!
//! Picks the [`ProposalToolApi`] implementation from runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::error::{ClientError, ClientResult};
#[cfg(feature = "local-api")]
use super::local::LocalProposalToolApi;
use super::proposal_tool::ProposalToolApi;
#[cfg(feature = "http-client")]
use super::remote::HttpProposalToolApi;
use crate::config::ClientConfig;

/// Which backend implementation to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    /// The REST backend over HTTP
    Http,
    /// The in-memory backend
    Local,
}

impl FromStr for ClientType {
    type Err = String;

    /// Parse client type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("http", "remote", "local", "mock")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" | "remote" => Ok(Self::Http),
            "local" | "mock" => Ok(Self::Local),
            _ => Err(format!("Unknown client type: {}", s)),
        }
    }
}

impl ClientType {
    /// Get client type from environment variable.
    ///
    /// Reads `POLARIS_CLIENT_TYPE`. Defaults to Http when `POLARIS_API_URL`
    /// is set, otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("POLARIS_CLIENT_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("POLARIS_API_URL").is_ok() {
            Self::Http
        } else {
            Self::Local
        }
    }
}

/// Creates [`ProposalToolApi`] instances.
///
/// # Example
/// ```ignore
/// use polaris_core::client::ClientFactory;
///
/// let api = ClientFactory::from_config_file("polaris.toml")?;
/// let names = api.telescope_names().await?;
/// ```
pub struct ClientFactory;

impl ClientFactory {
    /// Create a client of the given type.
    ///
    /// # Arguments
    /// * `client_type` - Which implementation to build
    /// * `config` - Settings used by the HTTP client
    ///
    /// # Returns
    /// * `Err(ClientError::Configuration)` if the implementation's feature is
    ///   disabled or its settings are invalid
    pub fn create(
        client_type: ClientType,
        config: &ClientConfig,
    ) -> ClientResult<Arc<dyn ProposalToolApi>> {
        match client_type {
            ClientType::Http => {
                #[cfg(feature = "http-client")]
                {
                    let api = HttpProposalToolApi::new(&config.http)?;
                    Ok(Arc::new(api) as Arc<dyn ProposalToolApi>)
                }
                #[cfg(not(feature = "http-client"))]
                {
                    let _ = config;
                    Err(ClientError::configuration(
                        "HTTP client feature not enabled",
                    ))
                }
            }
            ClientType::Local => Self::create_local(),
        }
    }

    /// Create an in-memory client seeded with the bundled telescope catalog.
    pub fn create_local() -> ClientResult<Arc<dyn ProposalToolApi>> {
        #[cfg(feature = "local-api")]
        {
            let api = LocalProposalToolApi::with_default_catalog()?;
            Ok(Arc::new(api) as Arc<dyn ProposalToolApi>)
        }
        #[cfg(not(feature = "local-api"))]
        {
            Err(ClientError::configuration("Local client feature not enabled"))
        }
    }

    /// Create a client from environment variables only.
    pub fn from_env() -> ClientResult<Arc<dyn ProposalToolApi>> {
        let config = ClientConfig::default().with_env_overrides();
        Self::create(ClientType::from_env(), &config)
    }

    /// Create a client from a TOML configuration file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the polaris.toml configuration file
    pub fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> ClientResult<Arc<dyn ProposalToolApi>> {
        let config = ClientConfig::from_file(config_path)?.with_env_overrides();
        Self::from_client_config(&config)
    }

    /// Create a client from `polaris.toml` in the standard locations.
    pub fn from_default_config() -> ClientResult<Arc<dyn ProposalToolApi>> {
        let config = ClientConfig::from_default_location()?.with_env_overrides();
        Self::from_client_config(&config)
    }

    pub fn from_client_config(config: &ClientConfig) -> ClientResult<Arc<dyn ProposalToolApi>> {
        let client_type = config
            .client_type()
            .map_err(|e| ClientError::configuration(format!("Invalid client type: {}", e)))?;
        Self::create(client_type, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_type_aliases() {
        assert_eq!("http".parse::<ClientType>().unwrap(), ClientType::Http);
        assert_eq!("Remote".parse::<ClientType>().unwrap(), ClientType::Http);
        assert_eq!("mock".parse::<ClientType>().unwrap(), ClientType::Local);
        assert!("grpc".parse::<ClientType>().is_err());
    }

    #[cfg(feature = "local-api")]
    #[tokio::test]
    async fn test_create_local_has_catalog() {
        let api = ClientFactory::create(ClientType::Local, &ClientConfig::default()).unwrap();
        assert!(!api.telescope_names().await.unwrap().is_empty());
    }
}
