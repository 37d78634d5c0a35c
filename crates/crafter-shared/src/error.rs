use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Unrecognized timestamp shape: {0}")]
    TimestampShape(String),

    #[error("Timestamp out of range")]
    TimestampRange,

    #[error("Timestamp parse error: {0}")]
    TimestampParse(#[from] chrono::ParseError),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}
