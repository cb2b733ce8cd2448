//! Unified error type for the preload queue.

use thiserror::Error;

/// All errors a load request can settle with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Empty image address")]
    EmptyAddress,
    #[error("Load cancelled")]
    Cancelled,
}
