use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChipMapError {
    #[error("Invalid rate selector: {0}")]
    InvalidRate(u8),

    #[error("Invalid input size")]
    InvalidInputSize,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Stream stalled after {consumed} input and {produced} output items")]
    StreamStalled { consumed: usize, produced: usize },

    #[error("Invalid mapper snapshot: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, ChipMapError>;
