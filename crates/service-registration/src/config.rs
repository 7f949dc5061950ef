//! Configuration for the registration client

use crate::{duration, error::Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Agent address used when none is configured
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";
/// Default health check interval
pub const DEFAULT_INTERVAL: &str = "10s";
/// Default health check timeout
pub const DEFAULT_TIMEOUT: &str = "5s";

/// Environment variable overriding the agent address
pub const ADDRESS_ENV: &str = "CONSUL_HTTP_ADDR";
/// Environment variable carrying the ACL token
pub const TOKEN_ENV: &str = "CONSUL_HTTP_TOKEN";
/// Environment variable selecting the datacenter
pub const DATACENTER_ENV: &str = "CONSUL_DATACENTER";
/// Environment variable overriding the check interval
pub const INTERVAL_ENV: &str = "CONSUL_CHECK_INTERVAL";
/// Environment variable overriding the check timeout
pub const TIMEOUT_ENV: &str = "CONSUL_CHECK_TIMEOUT";

/// Registration client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Agent address (`host:port`, optionally with an `http://` or `https://` scheme)
    #[serde(default = "default_address")]
    pub address: String,
    /// Health check probe period
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Health check probe timeout
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// ACL token sent with every request (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Datacenter to address (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            interval: default_interval(),
            timeout: default_timeout(),
            token: None,
            datacenter: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for an agent at `address`
    pub fn new(
        address: impl Into<String>,
        interval: impl Into<String>,
        timeout: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            interval: interval.into(),
            timeout: timeout.into(),
            ..Self::default()
        }
    }

    /// Set the ACL token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the datacenter
    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    /// Load configuration from file
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use async_fs::File;
        use futures::io::AsyncReadExt;

        let mut file = File::open(path.as_ref()).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        // YAML by extension, JSON otherwise
        let config: Self = match path.as_ref().extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            address: lookup(ADDRESS_ENV).unwrap_or(defaults.address),
            interval: lookup(INTERVAL_ENV).unwrap_or(defaults.interval),
            timeout: lookup(TIMEOUT_ENV).unwrap_or(defaults.timeout),
            token: lookup(TOKEN_ENV),
            datacenter: lookup(DATACENTER_ENV),
        }
    }

    /// Check the durations are well-formed
    pub fn validate(&self) -> Result<()> {
        duration::validate("interval", &self.interval)?;
        duration::validate("timeout", &self.timeout)?;
        Ok(())
    }
}
