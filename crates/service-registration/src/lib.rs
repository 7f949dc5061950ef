//! Service registration with a Consul-style registry agent
//!
//! This crate registers a running process as a service instance with the
//! registry's local agent, attaches a TCP health check to it and removes the
//! instance again on shutdown. Health checking itself is done by the registry.
//!
//! # Architecture
//!
//! The registry is reached through the [`Agent`] trait, so the client works
//! the same against the HTTP API ([`ConsulAgent`]) or an in-process double
//! ([`MemoryAgent`]). The local host name is read through a
//! [`HostnameProvider`] on every call.
//!
//! # Runtime
//!
//! [`ConsulAgent`] is built on `reqwest` and must be driven by a Tokio 1.x
//! runtime; awaited elsewhere its calls fail with [`AgentError::NoRuntime`].
//! Everything else, [`MemoryAgent`] included, runs on any executor.
//!
//! # Example
//!
//! ```no_run
//! use service_registration::RegistrationClient;
//!
//! # #[tokio::main]
//! # async fn main() -> service_registration::Result<()> {
//! let client = RegistrationClient::new("127.0.0.1:8500", "10s", "1s")?;
//!
//! // Publish this host's instance and verify its check
//! client.register("billing", 8080).await?;
//!
//! // ... serve ...
//!
//! client.deregister("billing").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod agent;
pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod hostname;
pub mod models;

pub use agent::{Agent, ConsulAgent, MemoryAgent};
pub use client::RegistrationClient;
pub use config::ClientConfig;
pub use error::{AgentError, Error, Result};
pub use hostname::{FixedHostname, HostnameProvider, SystemHostname};
pub use models::*;

/// Re-export key types for convenience
pub mod prelude {
    pub use crate::{
        Agent,
        AgentCheck,
        CheckStatus,
        ClientConfig,
        Error,
        RegistrationClient,
        Result,
        ServiceIdentity,
    };
}
