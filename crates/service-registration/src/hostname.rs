//! Host name resolution
//!
//! The client reads the host name on every call instead of caching it, so the
//! source is injected as a capability and tests can pin it.

use tracing::warn;

/// Source of the local host name
pub trait HostnameProvider: Send + Sync {
    /// Current full host name; empty if it cannot be resolved
    fn hostname(&self) -> String;
}

/// Reads the host name from the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostname;

impl HostnameProvider for SystemHostname {
    fn hostname(&self) -> String {
        match whoami::fallible::hostname() {
            Ok(name) => name,
            Err(e) => {
                warn!("Failed to resolve host name, continuing with an empty one: {}", e);
                String::new()
            }
        }
    }
}

/// Always returns the same host name
#[derive(Debug, Clone, Default)]
pub struct FixedHostname(pub String);

impl FixedHostname {
    /// Create a provider for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostnameProvider for FixedHostname {
    fn hostname(&self) -> String {
        self.0.clone()
    }
}
