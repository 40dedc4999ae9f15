//! Stock quotes as the rest of the system sees them.

use serde::{Deserialize, Serialize};

use crate::domain::error::PapertradeError;

/// A live price for one symbol, as returned by a quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Canonical (uppercase) ticker symbol.
    pub symbol: String,
    /// Company name reported by the quote source.
    pub name: String,
    /// Latest trade price in dollars.
    pub price: f64,
}

/// Canonicalize a user-entered symbol: trim whitespace and uppercase.
///
/// Symbols are stored and compared in canonical form, so `" nflx "` and
/// `"NFLX"` refer to the same holding.
pub fn normalize_symbol(input: &str) -> Result<String, PapertradeError> {
    let symbol = input.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(PapertradeError::InvalidSymbol {
            symbol: input.to_string(),
        });
    }
    Ok(symbol)
}
