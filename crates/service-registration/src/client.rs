//! Registration client
//!
//! Publishes this process as a service instance, attaches a TCP health check
//! and removes the instance again on shutdown.

use crate::{
    agent::{Agent, ConsulAgent},
    config::ClientConfig,
    duration,
    error::{Error, Result},
    hostname::{HostnameProvider, SystemHostname},
    models::{CheckRegistration, ServiceIdentity},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registers service instances with a registry agent
///
/// The client holds no per-instance state. Identity is recomputed from the
/// host name on every call, so `register` and `deregister` for the same
/// service name on the same host always address the same instance.
#[derive(Clone)]
pub struct RegistrationClient {
    agent: Arc<dyn Agent>,
    hostname: Arc<dyn HostnameProvider>,
    interval: String,
    timeout: String,
}

impl std::fmt::Debug for RegistrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationClient")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RegistrationClient {
    /// Client for the agent at `address`
    ///
    /// `interval` and `timeout` are duration strings such as `"10s"`. Fails
    /// with [`Error::Connection`] if the address is unusable; the agent is
    /// not contacted.
    ///
    /// The returned client talks HTTP through [`ConsulAgent`], so its calls
    /// must be awaited inside a Tokio 1.x runtime. Use [`Self::with_agent`]
    /// to run on another executor.
    pub fn new(address: &str, interval: &str, timeout: &str) -> Result<Self> {
        Self::from_config(&ClientConfig::new(address, interval, timeout))
    }

    /// Client built from a full configuration
    ///
    /// Like [`Self::new`], the client needs a Tokio 1.x runtime.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let agent = ConsulAgent::from_config(config)?;
        Self::with_agent(Arc::new(agent), &config.interval, &config.timeout)
    }

    /// Client over an arbitrary agent
    pub fn with_agent(agent: Arc<dyn Agent>, interval: &str, timeout: &str) -> Result<Self> {
        duration::validate("interval", interval)?;
        duration::validate("timeout", timeout)?;
        Ok(Self {
            agent,
            hostname: Arc::new(SystemHostname),
            interval: interval.to_string(),
            timeout: timeout.to_string(),
        })
    }

    /// Replace the host name source
    pub fn with_hostname_provider(mut self, provider: Arc<dyn HostnameProvider>) -> Self {
        self.hostname = provider;
        self
    }

    /// Check probe period
    pub fn interval(&self) -> &str {
        &self.interval
    }

    /// Check probe timeout
    pub fn timeout(&self) -> &str {
        &self.timeout
    }

    /// Identity of `service_name` on this host right now
    pub fn identity(&self, service_name: &str) -> ServiceIdentity {
        ServiceIdentity::new(service_name, self.hostname.hostname())
    }

    /// Publish `service_name` on `port` and verify its health check
    ///
    /// The outcome of publishing the service record is not returned: only the
    /// health check attachment decides the result. A failed publish is logged.
    /// The check is bound to the instance, so after a failed publish the agent
    /// usually rejects it and the call returns [`Error::Registration`].
    pub async fn register(&self, service_name: &str, port: u16) -> Result<()> {
        let identity = self.identity(service_name);
        let instance_id = identity.instance_id();
        let endpoint = identity.endpoint(port);
        debug!("Registering {} at {} (address {})", instance_id, endpoint, identity.host_name());

        let record = identity.record(port, &self.interval, &self.timeout);
        if let Err(e) = self.agent.service_register(&record).await {
            warn!("Publishing service {} failed, continuing: {}", instance_id, e);
        }

        self.attach_check(service_name, &endpoint, Some(&instance_id))
            .await?;
        info!("Registered service {} with passing check on {}", instance_id, endpoint);
        Ok(())
    }

    /// Register a TCP check named `service_name` against `endpoint` and verify it
    ///
    /// Reads the agent's checks exactly once. A check the agent has not
    /// probed yet can fail here even though it is about to pass.
    ///
    /// Unlike the check registered by [`Self::register`], this one is not
    /// bound to a service instance and survives deregistration.
    pub async fn attach_health_check(&self, service_name: &str, endpoint: &str) -> Result<()> {
        self.attach_check(service_name, endpoint, None).await
    }

    async fn attach_check(
        &self,
        service_name: &str,
        endpoint: &str,
        instance_id: Option<&str>,
    ) -> Result<()> {
        let mut check =
            CheckRegistration::tcp(service_name, endpoint, &self.interval, &self.timeout);
        if let Some(id) = instance_id {
            check = check.for_service(id);
        }

        self.agent
            .check_register(&check)
            .await
            .map_err(Error::Registration)?;

        let checks = self.agent.checks().await.map_err(Error::Lookup)?;
        let observed = checks
            .get(service_name)
            .ok_or_else(|| Error::MissingCheck(service_name.to_string()))?;
        debug!("Check {} is {}", service_name, observed.status);

        if !observed.status.is_passing() {
            return Err(Error::CheckNotPassing {
                name: service_name.to_string(),
                status: observed.status,
                output: observed.output.clone(),
            });
        }
        Ok(())
    }

    /// Remove this host's instance of `service_name`
    ///
    /// Checks bound to the instance are left to the agent to clean up.
    pub async fn deregister(&self, service_name: &str) -> Result<()> {
        let instance_id = self.identity(service_name).instance_id();
        self.agent
            .service_deregister(&instance_id)
            .await
            .map_err(|source| Error::Deregistration {
                instance_id: instance_id.clone(),
                source,
            })?;
        info!("Deregistered service {}", instance_id);
        Ok(())
    }
}
