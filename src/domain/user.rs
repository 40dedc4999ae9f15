//! Registered accounts.

use serde::{Deserialize, Serialize};

/// A registered account. `hash` is an Argon2id PHC string, never a
/// plaintext password; `cash` is the uninvested balance in dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub hash: String,
    pub cash: f64,
}

impl User {
    /// Redacted form for log output. The hash itself never appears in logs.
    pub fn describe(&self) -> String {
        format!("user {} ({})", self.id, self.username)
    }
}
