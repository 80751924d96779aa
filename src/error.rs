//! Error types for tickr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in tickr
#[derive(Debug, Error)]
pub enum TickrError {
    /// The host has no animation-frame primitive to drive ticks
    #[error("Frame source unavailable: {0}")]
    FrameSourceUnavailable(String),

    /// Configuration failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for tickr operations
pub type Result<T> = std::result::Result<T, TickrError>;
