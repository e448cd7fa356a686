//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Only deterministic input failures live here. Collaborator and persistence
/// failures are modeled at their own boundary in `lyricsweep-infra`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. blank or parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Configuration document could not be read.
///
/// Out-of-range values are never an error (they are sanitized); only a
/// document that is not valid JSON for [`crate::SweepConfig`] is.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}
