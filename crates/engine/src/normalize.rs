// In crates/engine/src/normalize.rs

use core_types::DecisionSymbol;

/// Maps a free-text reply onto a decision symbol.
///
/// The reply is split on whitespace and each token is upper-cased; the first
/// token that is exactly one of `valid` wins. A reply without such a token
/// yields `DecisionSymbol::FALLBACK` (NOT_BUY). This never fails.
pub fn normalize_response(raw: &str, valid: &[DecisionSymbol]) -> DecisionSymbol {
    raw.split_whitespace()
        .map(str::to_uppercase)
        .find_map(|token| valid.iter().copied().find(|symbol| symbol.as_str() == token))
        .unwrap_or(DecisionSymbol::FALLBACK)
}
