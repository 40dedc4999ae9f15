//! HTML templates using Askama.
//!
//! Money is preformatted into strings here so the templates never do
//! arithmetic or formatting themselves.

use askama::Template;
use axum::response::Html;

use crate::domain::ledger::LedgerEntry;
use crate::domain::money::usd;
use crate::domain::portfolio::Position;

use super::error::WebError;

/// Render a template into a full HTML response.
pub fn render<T: Template>(template: &T) -> Result<Html<String>, WebError> {
    template
        .render()
        .map(Html)
        .map_err(|e| WebError::internal(format!("template rendering failed: {e}")))
}

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
    pub positions: &'a [PositionRow],
    pub cash: &'a str,
    pub holdings_value: &'a str,
    pub net_worth: &'a str,
    pub complete: bool,
}

/// One portfolio table row, unpriced columns left empty.
pub struct PositionRow {
    pub symbol: String,
    pub name: Option<String>,
    pub shares: i64,
    pub price: Option<String>,
    pub value: Option<String>,
}

impl From<Position> for PositionRow {
    fn from(position: Position) -> Self {
        PositionRow {
            symbol: position.symbol,
            name: position.name,
            shares: position.shares,
            price: position.price.map(usd),
            value: position.value.map(usd),
        }
    }
}

#[derive(Template)]
#[template(path = "buy.html")]
pub struct BuyTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "sell.html")]
pub struct SellTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
    pub symbols: &'a [String],
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteFormTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "quoted.html")]
pub struct QuotedTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
    pub symbol: &'a str,
    pub name: &'a str,
    pub price: &'a str,
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
    pub entries: &'a [HistoryRow],
}

/// One ledger row for display; buys and sells both show a positive count
/// with the side spelled out.
pub struct HistoryRow {
    pub symbol: String,
    pub side: &'static str,
    pub shares: i64,
    pub price: String,
    pub time: String,
}

impl From<&LedgerEntry> for HistoryRow {
    fn from(entry: &LedgerEntry) -> Self {
        HistoryRow {
            symbol: entry.symbol.clone(),
            side: if entry.is_buy() { "Buy" } else { "Sell" },
            shares: entry.share.abs(),
            price: usd(entry.price),
            time: entry.time.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
    pub error: Option<&'a str>,
    pub next: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate<'a> {
    pub username: Option<&'a str>,
    pub flash: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
