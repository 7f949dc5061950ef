//! Data models for service registration
//!
//! Wire types mirror the agent HTTP API, so their serialized field names are
//! the agent's (`ID`, `Name`, `TCP`, ...) rather than Rust's.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one service instance on one host
///
/// The instance ID is `"{service}:{short host}"`, where the short host name is
/// everything before the first `.` of the full host name. Two identities built
/// from the same service name and host name always yield the same instance ID,
/// which is what makes re-registration an update rather than a duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    service_name: String,
    host_name: String,
    short_host_name: String,
}

impl ServiceIdentity {
    /// Derive an identity from a service name and the full local host name
    pub fn new(service_name: impl Into<String>, host_name: impl Into<String>) -> Self {
        let host_name = host_name.into();
        let short_host_name = short_host_name(&host_name).to_string();
        Self {
            service_name: service_name.into(),
            host_name,
            short_host_name,
        }
    }

    /// Caller-supplied service name
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Full host name, used as the published address
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Host name truncated at the first domain separator
    pub fn short_host_name(&self) -> &str {
        &self.short_host_name
    }

    /// Registry-wide key of this instance
    pub fn instance_id(&self) -> String {
        format!("{}:{}", self.service_name, self.short_host_name)
    }

    /// TCP address the health check probes
    pub fn endpoint(&self, port: u16) -> String {
        format!("{}:{}", self.short_host_name, port)
    }

    /// Build the record published for this instance
    pub fn record(&self, port: u16, interval: &str, timeout: &str) -> ServiceRecord {
        ServiceRecord {
            id: self.instance_id(),
            name: self.service_name.clone(),
            address: self.host_name.clone(),
            port,
            check: Some(ServiceCheck {
                interval: interval.to_string(),
                timeout: timeout.to_string(),
                tcp: self.endpoint(port),
            }),
        }
    }
}

/// Everything before the first `.`; the whole name if there is none
pub fn short_host_name(host_name: &str) -> &str {
    host_name.split('.').next().unwrap_or_default()
}

/// Service instance published to the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Instance ID
    #[serde(rename = "ID")]
    pub id: String,

    /// Service name, shared by all instances
    #[serde(rename = "Name")]
    pub name: String,

    /// Full host name of the instance
    #[serde(rename = "Address")]
    pub address: String,

    /// Service port
    #[serde(rename = "Port")]
    pub port: u16,

    /// Check embedded in the service definition
    #[serde(rename = "Check", skip_serializing_if = "Option::is_none", default)]
    pub check: Option<ServiceCheck>,
}

/// TCP check definition embedded in a [`ServiceRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCheck {
    /// Probe period, e.g. `"10s"`
    #[serde(rename = "Interval")]
    pub interval: String,

    /// Probe timeout, e.g. `"1s"`
    #[serde(rename = "Timeout")]
    pub timeout: String,

    /// `host:port` to connect to
    #[serde(rename = "TCP")]
    pub tcp: String,
}

/// Standalone check registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRegistration {
    /// Check name; also its ID since no explicit ID is given
    #[serde(rename = "Name")]
    pub name: String,

    /// Instance the check is bound to
    #[serde(rename = "ServiceID", skip_serializing_if = "Option::is_none", default)]
    pub service_id: Option<String>,

    /// `host:port` to connect to
    #[serde(rename = "TCP")]
    pub tcp: String,

    /// Probe period
    #[serde(rename = "Interval")]
    pub interval: String,

    /// Probe timeout
    #[serde(rename = "Timeout")]
    pub timeout: String,

    /// Status the check starts in
    #[serde(rename = "Status")]
    pub status: CheckStatus,
}

impl CheckRegistration {
    /// A TCP check starting out as passing
    pub fn tcp(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        interval: impl Into<String>,
        timeout: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service_id: None,
            tcp: endpoint.into(),
            interval: interval.into(),
            timeout: timeout.into(),
            status: CheckStatus::Passing,
        }
    }

    /// Bind the check to a service instance
    pub fn for_service(mut self, instance_id: impl Into<String>) -> Self {
        self.service_id = Some(instance_id.into());
        self
    }
}

/// Check state as listed by the agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCheck {
    /// Node running the check
    #[serde(rename = "Node")]
    pub node: String,

    /// Check ID
    #[serde(rename = "CheckID")]
    pub check_id: String,

    /// Check name
    #[serde(rename = "Name")]
    pub name: String,

    /// Current status
    #[serde(rename = "Status")]
    pub status: CheckStatus,

    /// Free-form notes
    #[serde(rename = "Notes")]
    pub notes: String,

    /// Output of the last probe
    #[serde(rename = "Output")]
    pub output: String,

    /// Bound service instance, empty for node checks
    #[serde(rename = "ServiceID")]
    pub service_id: String,

    /// Bound service name
    #[serde(rename = "ServiceName")]
    pub service_name: String,
}

/// Health state of a check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Probe succeeded
    Passing,
    /// Probe reported a warning
    Warning,
    /// Probe failed
    Critical,
    /// Instance is in maintenance mode
    Maintenance,
    /// Any status this client does not know about
    #[default]
    #[serde(other)]
    Unknown,
}

impl CheckStatus {
    /// Whether this is the passing sentinel
    pub fn is_passing(self) -> bool {
        self == Self::Passing
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passing => "passing",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Maintenance => "maintenance",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
