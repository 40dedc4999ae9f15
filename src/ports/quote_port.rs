//! Live quote lookup port trait.

use async_trait::async_trait;

use crate::domain::error::PapertradeError;
use crate::domain::quote::Quote;

/// Source of live prices.
///
/// `Ok(None)` means the source answered and knows no such symbol; that is
/// a user-facing "invalid symbol", not an outage. Transport and service
/// failures surface as `QuoteUnavailable`.
#[async_trait]
pub trait QuotePort {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError>;
}
