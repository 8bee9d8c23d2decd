//! Error types for the probe bridge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe denied by surface: {0}")]
    Denied(String),

    #[error("probe transport failed: {0}")]
    Transport(String),

    #[error("malformed probe payload: {0}")]
    MalformedPayload(String),

    #[error("probe io error: {0}")]
    Io(#[from] std::io::Error),
}
