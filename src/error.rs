//! Error types for rescache
//!
//! All modules use `RescacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rescache operations
pub type RescacheResult<T> = Result<T, RescacheError>;

/// Problems with the declared store bindings, detected at composition time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Cyclic store binding: {}", cycle.join(" -> "))]
    CyclicBinding { cycle: Vec<String> },

    #[error("Store binding '{namespace}' requires unknown binding '{missing}'")]
    UnresolvedBinding { namespace: String, missing: String },

    #[error("Store binding '{0}' is declared more than once")]
    DuplicateBinding(String),

    #[error("No store binding registered for '{0}'")]
    UnknownBinding(String),
}

/// All errors that can occur in rescache
#[derive(Error, Debug)]
pub enum RescacheError {
    // Cache errors
    #[error("Cache namespace cannot be empty")]
    EmptyNamespace,

    #[error("Invalid store configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to construct {namespace}: {reason}")]
    Construction { namespace: String, reason: String },

    #[error("Cached value for {namespace} is not a {expected}")]
    TypeMismatch {
        namespace: String,
        expected: &'static str,
    },

    // Workspace errors
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Client misconfigured: {0}")]
    ClientConfig(String),

    // Configuration file errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl RescacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a construction error for a store namespace
    pub fn construction(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Construction {
            namespace: namespace.into(),
            reason: reason.into(),
        }
    }

    /// Configuration errors are programming errors in the binding graph and
    /// must surface immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::EmptyNamespace)
    }

    /// Process exit code: 2 for fatal binding errors, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_fatal() {
            2
        } else {
            1
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Configuration(ConfigurationError::CyclicBinding { .. }) => {
                Some("Remove one of the `requires` edges so the bindings form a DAG")
            }
            Self::Configuration(ConfigurationError::UnresolvedBinding { .. }) => {
                Some("Register the missing binding before composing the workspace")
            }
            Self::WorkspaceNotFound(_) => Some("Run: rescache workspaces"),
            Self::ClientConfig(_) => Some("Set project_id and dataset under [[workspaces]]"),
            Self::ConfigInvalid { .. } => Some("Run: rescache config init --force"),
            _ => None,
        }
    }
}
