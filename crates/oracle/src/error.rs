// In crates/oracle/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Relay I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Relay input closed before a reply was received")]
    InputClosed,

    #[error("No stable reply after {polls} polls")]
    Timeout { polls: u32 },

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),

    #[error("API error: status {status}, msg: {msg}")]
    ApiError { status: u16, msg: String },

    #[error("Oracle response carried no choices")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, Error>;
