// In crates/ledger/src/lib.rs

use async_trait::async_trait;
use core_types::{DecisionRecord, DecisionSymbol, LastAction, Ticker};

pub mod error;
pub mod memory;
pub mod sqlite;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use memory::MemoryLedger;
pub use sqlite::{connect, SqliteLedger};

/// The append-only store of decision records.
///
/// Records are never updated or deleted. "Most recent" always means most
/// recently appended; timestamps are not compared.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The name of the backing store (e.g., "Sqlite", "Memory").
    fn name(&self) -> &'static str;

    /// Returns the decision of the most recent record for `ticker`, or
    /// `LastAction::None` when the ticker has no history.
    ///
    /// Stored decisions are re-validated: a value outside the four decision
    /// symbols reads as `LastAction::None`.
    async fn last_action(&self, ticker: &Ticker) -> Result<LastAction>;

    /// Appends one record.
    async fn append(&self, record: &DecisionRecord) -> Result<()>;

    /// Returns up to `limit` of the most recent records for `ticker`,
    /// oldest first.
    async fn history(&self, ticker: &Ticker, limit: usize) -> Result<Vec<DecisionRecord>>;
}

/// Interprets a stored decision column. Anything that is not one of the four
/// decision symbols is treated as no history.
pub fn stored_last_action(ticker: &Ticker, raw: &str) -> LastAction {
    match raw.parse::<DecisionSymbol>() {
        Ok(symbol) => LastAction::Decided(symbol),
        Err(_) => {
            tracing::warn!(%ticker, stored = raw, "Ignoring invalid decision in ledger.");
            LastAction::None
        }
    }
}
