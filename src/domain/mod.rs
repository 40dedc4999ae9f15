//! Core domain types and logic.

pub mod error;
pub mod ledger;
pub mod money;
pub mod password;
pub mod portfolio;
pub mod quote;
pub mod trade;
pub mod user;
