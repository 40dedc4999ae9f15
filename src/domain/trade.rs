//! Pure trade planning.
//!
//! Planning takes a balance, a holding and a live price and produces the
//! exact deltas a trade would apply, or the rule it violates. Nothing here
//! touches storage; the store re-plans inside its write transaction so the
//! checks hold against current balances, not the ones the page was
//! rendered from.

use crate::domain::error::PapertradeError;
use crate::domain::ledger::Holding;
use crate::domain::money::round_cents;
use crate::ports::config_port::ConfigPort;

/// Default starting balance for new accounts, in dollars.
pub const DEFAULT_STARTING_CASH: f64 = 10_000.0;

/// Starting balance from the `[trading]` config section.
pub fn starting_cash(config: &dyn ConfigPort) -> Result<f64, PapertradeError> {
    let cash = config.get_double("trading", "starting_cash", DEFAULT_STARTING_CASH);
    if cash < 0.0 || !cash.is_finite() {
        return Err(PapertradeError::ConfigInvalid {
            section: "trading".to_string(),
            key: "starting_cash".to_string(),
            reason: format!("starting_cash must be a non-negative amount, got {cash}"),
        });
    }
    Ok(round_cents(cash))
}

/// Outcome of planning a buy at a known price.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyPlan {
    pub quantity: i64,
    pub price: f64,
    pub total_cost: f64,
    pub cash_after: f64,
}

/// Outcome of planning a sell at a known price.
#[derive(Debug, Clone, PartialEq)]
pub struct SellPlan {
    pub quantity: i64,
    pub price: f64,
    pub proceeds: f64,
    pub cash_after: f64,
    pub remaining_shares: i64,
}

/// Parse a user-entered share count.
///
/// Only unsigned whole numbers are accepted, so `-5`, `3.5` and `abc` are
/// all rejected, as is `0`.
pub fn parse_quantity(input: &str) -> Result<i64, PapertradeError> {
    let trimmed = input.trim();
    let invalid = || PapertradeError::InvalidQuantity {
        input: input.to_string(),
    };
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let quantity: i64 = trimmed.parse().map_err(|_| invalid())?;
    if quantity < 1 {
        return Err(invalid());
    }
    Ok(quantity)
}

/// Plan buying `quantity` shares at `price` against a cash balance.
pub fn plan_buy(cash: f64, quantity: i64, price: f64) -> Result<BuyPlan, PapertradeError> {
    let total_cost = round_cents(quantity as f64 * price);
    if total_cost > cash {
        return Err(PapertradeError::InsufficientFunds {
            needed: total_cost,
            available: cash,
        });
    }
    Ok(BuyPlan {
        quantity,
        price,
        total_cost,
        cash_after: round_cents(cash - total_cost),
    })
}

/// Plan selling `quantity` shares of `symbol` at `price`.
///
/// Fails if the user holds none of the symbol, or fewer shares than
/// requested. Partial fills are not a thing here: a sell either executes
/// in full or not at all.
pub fn plan_sell(
    cash: f64,
    symbol: &str,
    holding: Option<&Holding>,
    quantity: i64,
    price: f64,
) -> Result<SellPlan, PapertradeError> {
    let held = match holding {
        Some(h) if h.shares > 0 => h.shares,
        _ => {
            return Err(PapertradeError::NoSuchHolding {
                symbol: symbol.to_string(),
            });
        }
    };
    if quantity > held {
        return Err(PapertradeError::InsufficientShares {
            symbol: symbol.to_string(),
            requested: quantity,
            held,
        });
    }
    let proceeds = round_cents(quantity as f64 * price);
    Ok(SellPlan {
        quantity,
        price,
        proceeds,
        cash_after: round_cents(cash + proceeds),
        remaining_shares: held - quantity,
    })
}
