//! The append-only trade ledger and the holdings derived from it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One recorded trade. Quantity is signed: positive for a buy, negative
/// for a sell. Rows are never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub symbol: String,
    pub share: i64,
    pub price: f64,
    /// Trade time in UTC.
    pub time: NaiveDateTime,
}

impl LedgerEntry {
    pub fn is_buy(&self) -> bool {
        self.share > 0
    }
}

/// Net position in one symbol, summed over the ledger. Only positions
/// with a positive share count appear in a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: i64,
}
