//! Registry agent capability
//!
//! The client only needs four operations from the registry's local agent.
//! [`ConsulAgent`] speaks the agent HTTP API; [`MemoryAgent`] keeps everything
//! in process and is meant for tests and local development.

pub mod consul;
pub mod memory;

pub use consul::ConsulAgent;
pub use memory::{MemoryAgent, Operation};

use crate::error::AgentError;
use crate::models::{AgentCheck, CheckRegistration, ServiceRecord};
use async_trait::async_trait;
use std::collections::HashMap;

/// Result of a single agent call
pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Operations the registration client consumes from a registry agent
#[async_trait]
pub trait Agent: Send + Sync {
    /// Upsert a service instance
    async fn service_register(&self, record: &ServiceRecord) -> AgentResult<()>;

    /// Remove a service instance
    async fn service_deregister(&self, instance_id: &str) -> AgentResult<()>;

    /// Upsert a health check
    async fn check_register(&self, check: &CheckRegistration) -> AgentResult<()>;

    /// Current checks keyed by check ID
    async fn checks(&self) -> AgentResult<HashMap<String, AgentCheck>>;
}
