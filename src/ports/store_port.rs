//! Persistent storage port trait.
//!
//! One implementation backs accounts, holdings and the trade ledger with
//! the same database, because `buy` and `sell` must commit their balance
//! update and ledger append as a single transaction.

use crate::domain::error::PapertradeError;
use crate::domain::ledger::{Holding, LedgerEntry};
use crate::domain::trade::{BuyPlan, SellPlan};
use crate::domain::user::User;

pub trait StorePort {
    /// Create an account with a hashed password and a starting balance.
    /// Fails with `DuplicateUsername` if the username is taken.
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: f64,
    ) -> Result<User, PapertradeError>;

    fn user_by_username(&self, username: &str) -> Result<Option<User>, PapertradeError>;

    fn user_by_id(&self, id: i64) -> Result<Option<User>, PapertradeError>;

    /// Net holdings with a positive share count, ordered by symbol.
    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, PapertradeError>;

    fn holding(&self, user_id: i64, symbol: &str) -> Result<Option<Holding>, PapertradeError>;

    /// Full trade ledger for one user, most recent first.
    fn history(&self, user_id: i64) -> Result<Vec<LedgerEntry>, PapertradeError>;

    /// Execute a buy at `price`: re-check the balance, append the ledger
    /// row and deduct the cost, all in one transaction. Returns the plan
    /// that was actually applied.
    fn buy(
        &self,
        user_id: i64,
        symbol: &str,
        quantity: i64,
        price: f64,
    ) -> Result<BuyPlan, PapertradeError>;

    /// Execute a sell at `price`: re-check the holding, append the ledger
    /// row and credit the proceeds, all in one transaction.
    fn sell(
        &self,
        user_id: i64,
        symbol: &str,
        quantity: i64,
        price: f64,
    ) -> Result<SellPlan, PapertradeError>;
}
