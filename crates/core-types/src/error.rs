// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown decision symbol: {0:?}")]
    UnknownDecision(String),
}

pub type Result<T> = std::result::Result<T, Error>;
