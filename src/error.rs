//! Error types for scriptcreds
//!
//! All modules use `ScriptCredsResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scriptcreds operations
pub type ScriptCredsResult<T> = Result<T, ScriptCredsError>;

/// All errors that can occur in scriptcreds
#[derive(Error, Debug)]
pub enum ScriptCredsError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("{reason}")]
    ConfigRejected { reason: String },

    // Script execution errors
    #[error("Failed to launch {label}: {source}")]
    ScriptLaunch {
        label: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} failed: {detail}")]
    ScriptFailed { label: &'static str, detail: String },

    #[error("{label} failed")]
    ScriptFailedSilent { label: &'static str },

    #[error("{label} timed out after {secs}s")]
    ScriptTimeout { label: &'static str, secs: u64 },

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
}

impl ScriptCredsError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a config rejection with a plain reason
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigRejected {
            reason: reason.into(),
        }
    }

    /// Build a script failure from an optional stderr diagnostic line
    pub fn script_failed(label: &'static str, detail: Option<String>) -> Self {
        match detail {
            Some(detail) => Self::ScriptFailed { label, detail },
            None => Self::ScriptFailedSilent { label },
        }
    }

    /// Check if the failure is worth retrying on the next request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ScriptLaunch { .. }
                | Self::ScriptFailed { .. }
                | Self::ScriptFailedSilent { .. }
                | Self::ScriptTimeout { .. }
        )
    }
}
