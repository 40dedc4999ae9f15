//! Storage adapter tests against an on-disk database.
//!
//! The in-memory unit tests cover the query logic; these cover what only
//! a real file shows: persistence across reopens and concurrent writers
//! racing on one account.

use approx::assert_relative_eq;
use papertrade::adapters::file_config_adapter::FileConfigAdapter;
use papertrade::adapters::sqlite_adapter::SqliteAdapter;
use papertrade::domain::error::PapertradeError;
use papertrade::ports::store_port::StorePort;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn disk_config(dir: &TempDir) -> FileConfigAdapter {
    let path = dir.path().join("papertrade.db");
    FileConfigAdapter::from_string(&format!(
        "[database]\npath = {}\npool_size = 8\n",
        path.display()
    ))
    .unwrap()
}

fn open_store(config: &FileConfigAdapter) -> SqliteAdapter {
    let store = SqliteAdapter::from_config(config).unwrap();
    store.initialize_schema().unwrap();
    store
}

#[test]
fn data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = disk_config(&dir);

    {
        let store = open_store(&config);
        let user = store.create_user("alice", "hash", 10_000.0).unwrap();
        store.buy(user.id, "AAPL", 10, 150.0).unwrap();
    }

    let store = open_store(&config);
    let user = store.user_by_username("alice").unwrap().unwrap();
    assert_relative_eq!(user.cash, 8_500.0);

    let holdings = store.holdings(user.id).unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].symbol, "AAPL");
    assert_eq!(holdings[0].shares, 10);

    assert_eq!(store.history(user.id).unwrap().len(), 1);
}

#[test]
fn concurrent_sells_cannot_oversell() {
    let dir = TempDir::new().unwrap();
    let config = disk_config(&dir);
    let store = Arc::new(open_store(&config));

    let user = store.create_user("alice", "hash", 10_000.0).unwrap();
    store.buy(user.id, "AAPL", 10, 150.0).unwrap();

    // Eight threads race to sell five shares each; only two can succeed.
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let user_id = user.id;
            thread::spawn(move || store.sell(user_id, "AAPL", 5, 160.0))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 2);

    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(
                    e,
                    PapertradeError::InsufficientShares { .. }
                        | PapertradeError::NoSuchHolding { .. }
                ),
                "unexpected failure: {e}"
            );
        }
    }

    assert!(store.holding(user.id, "AAPL").unwrap().is_none());
    let user = store.user_by_id(user.id).unwrap().unwrap();
    assert_relative_eq!(user.cash, 10_100.0);
}

#[test]
fn concurrent_buys_cannot_overspend() {
    let dir = TempDir::new().unwrap();
    let config = disk_config(&dir);
    let store = Arc::new(open_store(&config));

    let user = store.create_user("alice", "hash", 10_000.0).unwrap();

    // Each buy costs 2250; four fit into 10000, the rest must fail.
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            let user_id = user.id;
            thread::spawn(move || store.buy(user_id, "AAPL", 15, 150.0))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 4);

    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, PapertradeError::InsufficientFunds { .. }),
                "unexpected failure: {e}"
            );
        }
    }

    let user = store.user_by_id(user.id).unwrap().unwrap();
    assert_relative_eq!(user.cash, 1_000.0);
    let holding = store.holding(user.id, "AAPL").unwrap().unwrap();
    assert_eq!(holding.shares, 60);
    assert_eq!(store.history(user.id).unwrap().len(), 4);
}
