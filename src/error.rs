//! Error types for the agentbook library.

use thiserror::Error;

/// Errors surfaced by the parser, resolvers and their collaborators.
///
/// Ordinary "reference did not resolve" outcomes are never errors; they are
/// queued as resolution issues on the resolver instead.
#[derive(Debug, Clone, Error)]
pub enum BookError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Local agent registry error: {0}")]
    RegistryError(String),

    #[error("Federated registry error: {0}")]
    FederationError(String),

    #[error("Embedded agent \"{agent_name}\" not found in book of agent {parent}")]
    EmbeddedAgentNotFound { parent: String, agent_name: String },

    #[error("Failed to build reference resolver: {0}")]
    ResolverBuildError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for BookError {
    fn from(err: std::io::Error) -> Self {
        BookError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for BookError {
    fn from(err: config::ConfigError) -> Self {
        BookError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for BookError {
    fn from(err: reqwest::Error) -> Self {
        BookError::FederationError(err.to_string())
    }
}

impl From<serde_json::Error> for BookError {
    fn from(err: serde_json::Error) -> Self {
        BookError::SerializationError(err.to_string())
    }
}
