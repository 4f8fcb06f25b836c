// In crates/engine/src/lib.rs

use std::sync::Arc;

use chrono::Utc;
use core_types::{AnnotatedSample, DecisionRecord, DecisionSymbol, LastAction, Ticker};
use indicators::IndicatorEngine;
use ledger::Ledger;
use market_data::MarketData;
use oracle::OracleTransport;

pub mod error;
pub mod normalize;
pub mod prompt;

// Re-export the most important types for easy access.
pub use error::{Cause, Error, Result};
pub use normalize::normalize_response;
pub use prompt::PromptRenderer;

/// Runs the decision pipeline for one ticker at a time.
///
/// A run reads the ticker's last action, fetches prices, computes indicators,
/// asks the oracle and appends exactly one record. A failed run appends
/// nothing. Runs take `&mut self`, so one orchestrator never interleaves two
/// of them and the read-then-append of the last action cannot race.
pub struct DecisionOrchestrator {
    market_data: Box<dyn MarketData>,
    indicators: IndicatorEngine,
    ledger: Arc<dyn Ledger>,
    oracle: Box<dyn OracleTransport>,
    renderer: PromptRenderer,
}

/// What a run knows before it talks to the oracle.
struct PreparedRun {
    last_action: LastAction,
    current: AnnotatedSample,
    prompt: String,
}

impl DecisionOrchestrator {
    pub fn new(
        market_data: Box<dyn MarketData>,
        indicators: IndicatorEngine,
        ledger: Arc<dyn Ledger>,
        oracle: Box<dyn OracleTransport>,
    ) -> Self {
        let renderer = PromptRenderer::new(indicators.settings());
        tracing::info!(
            market_data = market_data.name(),
            ledger = ledger.name(),
            oracle = oracle.name(),
            "Decision orchestrator ready."
        );
        Self {
            market_data,
            indicators,
            ledger,
            oracle,
            renderer,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Opens the oracle session ahead of a batch.
    pub async fn open_session(&mut self) -> Result<()> {
        self.oracle.start_session().await.map_err(Error::Session)
    }

    /// Closes the oracle session after a batch.
    pub async fn close_session(&mut self) -> Result<()> {
        self.oracle.stop_session().await.map_err(Error::Session)
    }

    /// Runs the full pipeline for `ticker` and returns the appended record.
    ///
    /// # Errors
    ///
    /// `Error::Orchestration` naming the ticker and the failing collaborator.
    /// Nothing is appended to the ledger in that case.
    pub async fn run_analysis(&mut self, ticker: &Ticker) -> Result<DecisionRecord> {
        tracing::info!(%ticker, "Starting analysis.");
        let record = self.analyse(ticker).await.map_err(|cause| {
            tracing::error!(%ticker, error = %cause, "Analysis failed.");
            Error::Orchestration {
                ticker: ticker.clone(),
                cause,
            }
        })?;

        tracing::info!(
            %ticker,
            last_action = %record.last_action,
            decision = %record.decision,
            "Decision recorded."
        );
        Ok(record)
    }

    /// Analyses each ticker in order. A failure for one ticker does not stop
    /// the next; the results line up with `tickers`.
    pub async fn run_batch(&mut self, tickers: &[Ticker]) -> Vec<Result<DecisionRecord>> {
        let mut results = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            results.push(self.run_analysis(ticker).await);
        }

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(total = tickers.len(), failed, "Batch finished.");
        results
    }

    /// Renders the prompt a run would send for `ticker`, without asking the
    /// oracle or touching the ledger beyond the last-action read.
    pub async fn preview_prompt(&self, ticker: &Ticker) -> Result<String> {
        self.prepare(ticker)
            .await
            .map(|prepared| prepared.prompt)
            .map_err(|cause| Error::Orchestration {
                ticker: ticker.clone(),
                cause,
            })
    }

    async fn prepare(&self, ticker: &Ticker) -> std::result::Result<PreparedRun, Cause> {
        // 1. Last action
        let last_action = self.ledger.last_action(ticker).await?;
        tracing::debug!(%ticker, %last_action, "Read last action.");

        // 2. Prices
        let samples = self.market_data.fetch_prices(ticker).await?;
        tracing::info!(%ticker, samples = samples.len(), "Fetched price data.");

        // 3. Indicators, keeping only the latest row
        let current = self
            .indicators
            .compute(&samples)?
            .pop()
            .ok_or(indicators::Error::EmptyInput)?;

        // 4. Prompt
        let prompt = self.renderer.render(ticker, &current, last_action);

        Ok(PreparedRun {
            last_action,
            current,
            prompt,
        })
    }

    async fn analyse(&mut self, ticker: &Ticker) -> std::result::Result<DecisionRecord, Cause> {
        let PreparedRun {
            last_action,
            current,
            prompt,
        } = self.prepare(ticker).await?;

        // 5. Oracle
        tracing::info!(%ticker, oracle = self.oracle.name(), "Asking the oracle.");
        let reply = self.oracle.send_prompt(&prompt).await?;

        // 6. Normalize
        let decision = normalize_response(&reply, &DecisionSymbol::ALL);
        tracing::debug!(%ticker, reply = %reply, %decision, "Normalized oracle reply.");

        // 7. Record
        let record = DecisionRecord {
            timestamp: Utc::now(),
            ticker: ticker.clone(),
            last_action,
            close: current.sample.close,
            sma: current.indicators.sma,
            rsi: current.indicators.rsi,
            decision,
        };
        self.ledger.append(&record).await?;

        Ok(record)
    }
}
