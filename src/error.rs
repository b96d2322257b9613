//! Error types for gsim.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("extrema channel underflow: drained {drained} of {expected} records")]
    ChannelUnderflow { expected: usize, drained: usize },

    #[error("extrema channel overflow: {extra} record(s) left after draining {expected}")]
    ChannelOverflow { expected: usize, extra: usize },

    #[error("extrema channel capacity {capacity} cannot hold {records} records per step")]
    ChannelTooSmall { capacity: usize, records: usize },

    #[error("extrema channel disconnected while particle {particle} was producing")]
    ChannelDisconnected { particle: usize },

    #[error("engine is {state}, cannot {action}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },

    #[error("console write failed: {0}")]
    Console(#[from] std::io::Error),

    #[error("failed to write output {path}: {source}")]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;
