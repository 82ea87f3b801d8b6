use std::path::PathBuf;

use thiserror::Error;

/// Errors that can arise while loading, saving or authenticating against the world core.
///
/// Runtime lookups on the live store never produce these; a missing room, entity or
/// template is an `Option::None`, not an error.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Wrapper around IO errors (directory walks, reads, writes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around YAML parse and emit errors for world files.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapper around sled's error type (account store).
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// A world file exists but could not be understood.
    #[error("malformed world file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A dice expression such as `2d6+1` could not be parsed.
    #[error("invalid dice expression: {0}")]
    InvalidDice(String),

    /// Credentials rejected or account banned.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Internal error (task join errors, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}
