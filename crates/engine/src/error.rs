// In crates/engine/src/error.rs

use core_types::Ticker;
use thiserror::Error;

/// The collaborator failure behind a failed run.
#[derive(Error, Debug)]
pub enum Cause {
    #[error("Market data gateway failed: {0}")]
    DataUnavailable(#[from] market_data::Error),

    #[error("Indicator computation failed: {0}")]
    IndicatorComputationFailure(#[from] indicators::Error),

    #[error("Oracle transport failed: {0}")]
    OracleTransportFailure(#[from] oracle::Error),

    #[error("Ledger operation failed: {0}")]
    LedgerFailure(#[from] ledger::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Analysis of {ticker} failed: {cause}")]
    Orchestration { ticker: Ticker, cause: Cause },

    #[error("Oracle session error: {0}")]
    Session(#[source] oracle::Error),
}

impl Error {
    pub fn ticker(&self) -> Option<&Ticker> {
        match self {
            Error::Orchestration { ticker, .. } => Some(ticker),
            Error::Session(_) => None,
        }
    }

    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Error::Orchestration { cause, .. } => Some(cause),
            Error::Session(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
