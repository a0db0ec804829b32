//! # Core Type Definitions
//!
//! Error taxonomy shared by every ppl-core module.
//!
//! ## Propagation
//!
//! - Structural violations (`InvalidEntity`, `DuplicateEntity`, `NotFound`,
//!   `InvalidEdge`) are always returned to the caller.
//! - `Decode` and `Adapter` are produced by per-attribute and per-file work and
//!   are normally recovered where they occur: the value or file is degraded or
//!   skipped, a warning is logged, and the batch continues.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the ppl system.
///
/// - No silent failures for structural violations
/// - Use `Result<T, PplError>` for fallible operations
/// - The core never panics; every error is recoverable by the caller
#[derive(Debug, Error)]
pub enum PplError {
    /// The entity lacks a field the operation requires (usually the UID).
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// `add` was called with a UID already present in the graph.
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    /// The requested entity was not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// An edge references an endpoint that is not in the graph.
    #[error("Invalid edge: {source_id} -> {target_id}")]
    InvalidEdge {
        source_id: String,
        target_id: String,
    },

    /// A file that must exist does not.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A persisted attribute payload could not be decoded.
    #[error("Decode error in attribute {attribute}: {message}")]
    Decode { attribute: String, message: String },

    /// A single file in a folder could not be parsed by its format adapter.
    #[error("Adapter error in {}: {message}", .path.display())]
    Adapter { path: PathBuf, message: String },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration file is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PplError {
    /// Whether the error is a structural invariant violation.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidEntity(_)
                | Self::DuplicateEntity(_)
                | Self::NotFound(_)
                | Self::InvalidEdge { .. }
        )
    }
}

/// Map an I/O error for `path`, turning `NotFound` into [`PplError::FileNotFound`].
pub(crate) fn io_error(path: &std::path::Path, err: &std::io::Error) -> PplError {
    if err.kind() == std::io::ErrorKind::NotFound {
        PplError::FileNotFound(path.to_path_buf())
    } else {
        PplError::IoError(format!("{}: {}", path.display(), err))
    }
}

// =============================================================================
// TESTS
// =============================================================================
