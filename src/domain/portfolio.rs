//! Portfolio valuation: holdings priced with live quotes.

use crate::domain::ledger::Holding;
use crate::domain::money::round_cents;
use crate::domain::quote::Quote;

/// One holding with its live valuation attached.
///
/// `price` and `value` are `None` when the quote source had no answer for
/// the symbol at render time. The position still appears so the portfolio
/// never silently shrinks; callers show it unpriced instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub name: Option<String>,
    pub shares: i64,
    pub price: Option<f64>,
    pub value: Option<f64>,
}

/// A user's full portfolio at a moment in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioView {
    pub positions: Vec<Position>,
    pub cash: f64,
    /// Sum of the priced position values. Unpriced positions contribute
    /// nothing, which `complete` flags.
    pub holdings_value: f64,
    pub net_worth: f64,
    /// False when at least one position could not be priced.
    pub complete: bool,
}

/// Value holdings against the quotes fetched for them.
///
/// Position order follows the input, which the store returns sorted by
/// symbol.
pub fn value_portfolio(cash: f64, holdings: Vec<(Holding, Option<Quote>)>) -> PortfolioView {
    let mut positions = Vec::with_capacity(holdings.len());
    let mut holdings_value = 0.0;
    let mut complete = true;

    for (holding, quote) in holdings {
        let position = match quote {
            Some(quote) => {
                let value = round_cents(holding.shares as f64 * quote.price);
                holdings_value += value;
                Position {
                    symbol: holding.symbol,
                    name: Some(quote.name),
                    shares: holding.shares,
                    price: Some(quote.price),
                    value: Some(value),
                }
            }
            None => {
                complete = false;
                Position {
                    symbol: holding.symbol,
                    name: None,
                    shares: holding.shares,
                    price: None,
                    value: None,
                }
            }
        };
        positions.push(position);
    }

    let holdings_value = round_cents(holdings_value);
    PortfolioView {
        positions,
        cash,
        holdings_value,
        net_worth: round_cents(cash + holdings_value),
        complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(symbol: &str, shares: i64) -> Holding {
        Holding {
            symbol: symbol.to_string(),
            shares,
        }
    }

    fn quote(symbol: &str, price: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc"),
            price,
        }
    }

    #[test]
    fn empty_portfolio_is_just_cash() {
        let view = value_portfolio(10_000.0, vec![]);
        assert!(view.positions.is_empty());
        assert_eq!(view.holdings_value, 0.0);
        assert_eq!(view.net_worth, 10_000.0);
        assert!(view.complete);
    }

    #[test]
    fn sums_priced_positions_into_net_worth() {
        let view = value_portfolio(
            8_500.0,
            vec![
                (holding("AAPL", 10), Some(quote("AAPL", 150.0))),
                (holding("NFLX", 2), Some(quote("NFLX", 400.0))),
            ],
        );
        assert_eq!(view.holdings_value, 2_300.0);
        assert_eq!(view.net_worth, 10_800.0);
        assert!(view.complete);
        assert_eq!(view.positions[0].value, Some(1_500.0));
    }

    #[test]
    fn unpriced_position_is_kept_and_flagged() {
        let view = value_portfolio(
            100.0,
            vec![
                (holding("AAPL", 1), Some(quote("AAPL", 150.0))),
                (holding("GONE", 3), None),
            ],
        );
        assert_eq!(view.positions.len(), 2);
        assert!(!view.complete);
        assert_eq!(view.positions[1].price, None);
        assert_eq!(view.holdings_value, 150.0);
        assert_eq!(view.net_worth, 250.0);
    }
}
