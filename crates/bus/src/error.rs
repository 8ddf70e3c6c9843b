//! Error types for bus operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid bus configuration: {0}")]
    Config(String),

    #[error("stream '{0}' exists with a conflicting subject set")]
    StreamConflict(String),

    #[error("bus transport error: {0}")]
    Transport(String),
}
