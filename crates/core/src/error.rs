use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("stage out of range: {0} (expected 1..=16)")]
    StageOutOfRange(u8),

    #[error("invalid step: {0} (expected 1 or 2)")]
    InvalidStep(u8),

    #[error("unknown environment: {0:?} (expected 'dev' or 'prod')")]
    UnknownEnvironment(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
