// In crates/ledger/src/memory.rs

use async_trait::async_trait;
use core_types::{DecisionRecord, LastAction, Ticker};
use tokio::sync::Mutex;

use crate::{Ledger, Result};

/// A ledger held in process memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing history, in append order.
    pub fn with_records(records: Vec<DecisionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// A copy of every record, in append order.
    pub async fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn name(&self) -> &'static str {
        "Memory"
    }

    async fn last_action(&self, ticker: &Ticker) -> Result<LastAction> {
        let records = self.records.lock().await;
        let last = records
            .iter()
            .rev()
            .find(|r| &r.ticker == ticker)
            .map(|r| LastAction::Decided(r.decision))
            .unwrap_or_default();
        Ok(last)
    }

    async fn append(&self, record: &DecisionRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn history(&self, ticker: &Ticker, limit: usize) -> Result<Vec<DecisionRecord>> {
        let records = self.records.lock().await;
        let mut matching: Vec<DecisionRecord> = records
            .iter()
            .rev()
            .filter(|r| &r.ticker == ticker)
            .take(limit)
            .cloned()
            .collect();
        matching.reverse();
        Ok(matching)
    }
}
