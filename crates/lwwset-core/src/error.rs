//! Error types for the LWW element set.

use thiserror::Error;

/// Errors surfaced by the set and its configuration.
///
/// Mutations and merges never fail; errors only come from contract
/// violations at the edges of the API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LwwError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LwwError>;
