// In crates/ledger/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid ledger database URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to connect to the ledger database: {0}")]
    ConnectionError(#[from] sqlx::Error),
    #[error("Ledger migration failed: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("Ledger operation failed: {0}")]
    OperationFailed(sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
