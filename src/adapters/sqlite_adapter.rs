//! SQLite storage adapter.
//!
//! Backs accounts and the trade ledger with one database file. Trades run
//! under `BEGIN IMMEDIATE` and re-check balances against the rows they are
//! about to change, so two requests racing on the same account cannot both
//! pass a funds or holdings check that only one of them satisfies.

use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::domain::error::PapertradeError;
use crate::domain::ledger::{Holding, LedgerEntry};
use crate::domain::money::round_cents;
use crate::domain::trade::{plan_buy, plan_sell, BuyPlan, SellPlan};
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;

/// Ledger timestamps are stored as TEXT in this format, always UTC.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err<E: std::fmt::Display>(e: E) -> PapertradeError {
    PapertradeError::Database {
        reason: e.to_string(),
    }
}

fn query_err<E: std::fmt::Display>(e: E) -> PapertradeError {
    PapertradeError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, PapertradeError> {
        let db_path = config.require_string("database", "path")?;
        let pool_size = config.get_int("database", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path).with_init(init_connection);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    /// In-memory database with a single pooled connection. Every `:memory:`
    /// connection is its own database, so the pool must never open a second.
    pub fn in_memory() -> Result<Self, PapertradeError> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                hash TEXT NOT NULL,
                cash REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS shares (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users (id),
                symbol TEXT NOT NULL,
                share INTEGER NOT NULL,
                price REAL NOT NULL,
                time TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_shares_user ON shares (user_id);
            CREATE INDEX IF NOT EXISTS idx_shares_user_symbol ON shares (user_id, symbol);",
        )
        .map_err(query_err)?;

        Ok(())
    }
}

fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        hash: row.get(2)?,
        cash: row.get(3)?,
    })
}

fn cash_of(conn: &Connection, user_id: i64) -> Result<f64, PapertradeError> {
    conn.query_row(
        "SELECT cash FROM users WHERE id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(query_err)?
    .ok_or_else(|| PapertradeError::Database {
        reason: format!("no user with id {user_id}"),
    })
}

/// Net share count for one symbol, `None` when the user never traded it.
fn net_shares(
    conn: &Connection,
    user_id: i64,
    symbol: &str,
) -> Result<Option<i64>, PapertradeError> {
    conn.query_row(
        "SELECT SUM(share) FROM shares WHERE user_id = ?1 AND symbol = ?2",
        params![user_id, symbol],
        |row| row.get(0),
    )
    .map_err(query_err)
}

fn record_trade(
    conn: &Connection,
    user_id: i64,
    symbol: &str,
    share: i64,
    price: f64,
) -> Result<(), PapertradeError> {
    let time = Utc::now().naive_utc().format(TIME_FORMAT).to_string();
    conn.execute(
        "INSERT INTO shares (user_id, symbol, share, price, time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user_id, symbol, share, price, time],
    )
    .map_err(query_err)?;
    Ok(())
}

impl StorePort for SqliteAdapter {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: f64,
    ) -> Result<User, PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;
        let cash = round_cents(starting_cash);

        let result = conn.execute(
            "INSERT INTO users (username, hash, cash) VALUES (?1, ?2, ?3)",
            params![username, password_hash, cash],
        );
        match result {
            Ok(_) => {}
            // The only constraint on this insert is the unique username.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(PapertradeError::DuplicateUsername {
                    username: username.to_string(),
                });
            }
            Err(e) => return Err(query_err(e)),
        }

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            hash: password_hash.to_string(),
            cash,
        })
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>, PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.query_row(
            "SELECT id, username, hash, cash FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(query_err)
    }

    fn user_by_id(&self, id: i64) -> Result<Option<User>, PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;
        conn.query_row(
            "SELECT id, username, hash, cash FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(query_err)
    }

    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT symbol, SUM(share) AS shares FROM shares
                 WHERE user_id = ?1
                 GROUP BY symbol
                 HAVING SUM(share) > 0
                 ORDER BY symbol ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(Holding {
                    symbol: row.get(0)?,
                    shares: row.get(1)?,
                })
            })
            .map_err(query_err)?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row.map_err(query_err)?);
        }
        Ok(holdings)
    }

    fn holding(&self, user_id: i64, symbol: &str) -> Result<Option<Holding>, PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;
        let net = net_shares(&conn, user_id, symbol)?;
        Ok(net.filter(|shares| *shares > 0).map(|shares| Holding {
            symbol: symbol.to_string(),
            shares,
        }))
    }

    fn history(&self, user_id: i64) -> Result<Vec<LedgerEntry>, PapertradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, symbol, share, price, time FROM shares
                 WHERE user_id = ?1
                 ORDER BY time DESC, id DESC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let time_str: String = row.get(4)?;
                let time = NaiveDateTime::parse_from_str(&time_str, TIME_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        time_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(LedgerEntry {
                    id: row.get(0)?,
                    symbol: row.get(1)?,
                    share: row.get(2)?,
                    price: row.get(3)?,
                    time,
                })
            })
            .map_err(query_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(query_err)?);
        }
        Ok(entries)
    }

    fn buy(
        &self,
        user_id: i64,
        symbol: &str,
        quantity: i64,
        price: f64,
    ) -> Result<BuyPlan, PapertradeError> {
        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_err)?;

        // Plan against the balance as of this transaction, not the one the
        // form was rendered from.
        let cash = cash_of(&tx, user_id)?;
        let plan = plan_buy(cash, quantity, price)?;

        record_trade(&tx, user_id, symbol, quantity, price)?;
        tx.execute(
            "UPDATE users SET cash = ?1 WHERE id = ?2",
            params![plan.cash_after, user_id],
        )
        .map_err(query_err)?;
        tx.commit().map_err(query_err)?;

        Ok(plan)
    }

    fn sell(
        &self,
        user_id: i64,
        symbol: &str,
        quantity: i64,
        price: f64,
    ) -> Result<SellPlan, PapertradeError> {
        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(query_err)?;

        let cash = cash_of(&tx, user_id)?;
        let holding = net_shares(&tx, user_id, symbol)?.map(|shares| Holding {
            symbol: symbol.to_string(),
            shares,
        });
        let plan = plan_sell(cash, symbol, holding.as_ref(), quantity, price)?;

        record_trade(&tx, user_id, symbol, -quantity, price)?;
        tx.execute(
            "UPDATE users SET cash = ?1 WHERE id = ?2",
            params![plan.cash_after, user_id],
        )
        .map_err(query_err)?;
        tx.commit().map_err(query_err)?;

        Ok(plan)
    }
}
