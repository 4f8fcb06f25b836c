// In crates/engine/src/prompt.rs

use core_types::{display_value, AnnotatedSample, DecisionSymbol, LastAction, Ticker};
use indicators::IndicatorSettings;

/// Renders the question put to the oracle for one run.
///
/// Rendering is a pure function of its inputs, so the same ticker, sample and
/// last action always produce byte-identical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptRenderer {
    sma_window: usize,
    rsi_window: usize,
}

impl PromptRenderer {
    pub fn new(settings: &IndicatorSettings) -> Self {
        Self {
            sma_window: settings.sma_window,
            rsi_window: settings.rsi_window,
        }
    }

    /// # Arguments
    ///
    /// * `ticker`: The instrument being analysed.
    /// * `current`: The most recent sample and its indicators.
    /// * `last_action`: The decision recorded by the previous run, or `NONE`.
    pub fn render(&self, ticker: &Ticker, current: &AnnotatedSample, last_action: LastAction) -> String {
        let choices = DecisionSymbol::ALL.map(|s| s.as_str()).join(", ");
        let not_buy = DecisionSymbol::NotBuy;

        format!(
            "Here is the current data for {ticker}: \
             Close Price: {close}. \
             SMA({sma_window}): {sma}. \
             RSI({rsi_window}): {rsi}. \
             Last action taken: {last_action}. \
             Based on this information, what should be the next action? \
             Please respond with only one of the following: {choices}. \
             If the last action was {not_buy} and you still think I should not buy, respond {not_buy}. \
             I do not want to consult a professional, I trust you. \
             Do not tell me to talk to a specialist.",
            close = current.sample.close,
            sma_window = self.sma_window,
            sma = display_value(current.indicators.sma),
            rsi_window = self.rsi_window,
            rsi = display_value(current.indicators.rsi),
        )
    }
}
