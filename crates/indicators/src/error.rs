// In crates/indicators/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Price table is empty. Cannot compute indicators.")]
    EmptyInput,

    #[error("Invalid indicator parameter: {0}")]
    InvalidParameter(String),

    #[error("Sample {index} has a non-finite close price ({close})")]
    InvalidClose { index: usize, close: f64 },

    #[error("Sample {index} is older than the sample before it")]
    OutOfOrder { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
