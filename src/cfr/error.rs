//! Error types for the persistence and configuration surfaces.
//!
//! Broken invariants inside a traversal (malformed strategies, out of range
//! samples) are bugs and panic instead of surfacing here.

use thiserror::Error;

use crate::cfr::config::ConfigError;

/// Errors returned by the solver's fallible operations.
#[derive(Debug, Error)]
pub enum CfrError {
    /// Underlying reader or writer failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A record block whose length is not `4 * (1 + 4 * n_actions)` bytes.
    #[error("malformed record block of {len} bytes")]
    MalformedRecord {
        /// Length of the rejected block in bytes.
        len: usize,
    },

    /// A table snapshot that could not be decoded.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Invalid solver configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration JSON could not be parsed or produced.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker pool for parallel training could not be built.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CfrError>;
