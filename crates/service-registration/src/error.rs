//! Error types for service registration

use crate::models::CheckStatus;
use thiserror::Error;

/// Errors raised by an [`Agent`](crate::agent::Agent) implementation
#[derive(Error, Debug)]
pub enum AgentError {
    /// Transport failure talking to the agent
    #[error("HTTP request to agent failed")]
    Http(#[from] reqwest::Error),

    /// The agent answered with a non-success status
    #[error("Unexpected response code: {status} ({body})")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the agent
        body: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode agent response")]
    Decode(#[from] serde_json::Error),

    /// Unknown service instance
    #[error("Unknown service ID: {0}")]
    NotFound(String),

    /// The HTTP agent was called outside a Tokio runtime
    #[error("HTTP agent requires a Tokio 1.x runtime")]
    NoRuntime,

    /// Failure injected or reported by an in-process agent
    #[error("Agent unavailable: {0}")]
    Unavailable(String),
}

/// Service registration error type
#[derive(Error, Debug)]
pub enum Error {
    /// The agent client handle could not be constructed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Rejected client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Registering the health check failed
    #[error("Check registration failed")]
    Registration(#[source] AgentError),

    /// Reading back the agent's checks failed
    #[error("Check lookup failed")]
    Lookup(#[source] AgentError),

    /// The registered check is absent from the read-back
    #[error("Missing check: {0}")]
    MissingCheck(String),

    /// The check exists but is not passing yet
    #[error("Check not passing: {name} is {status} ({output})")]
    CheckNotPassing {
        /// Check name
        name: String,
        /// Observed status
        status: CheckStatus,
        /// Output of the last probe, if any
        output: String,
    },

    /// Removing the instance failed
    #[error("Failed to deregister {instance_id}")]
    Deregistration {
        /// Instance that was being removed
        instance_id: String,
        /// Underlying agent error
        #[source]
        source: AgentError,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
