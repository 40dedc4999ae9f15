//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::iex_adapter::IexAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::web::{build_router, hash_password, AppState};
use crate::domain::error::PapertradeError;
use crate::domain::money::usd;
use crate::domain::password::PasswordPolicy;
use crate::domain::quote::normalize_symbol;
use crate::domain::trade::starting_cash;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;
use crate::ports::store_port::StorePort;

const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Parser, Debug)]
#[command(name = "papertrade", about = "Simulated stock-trading web application")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the database schema and exit
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create a user, reading the password from stdin
    AddUser {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        username: String,
    },
    /// Look up one quote from the configured provider
    Quote {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
    },
    /// Print a fresh session secret
    GenSecret,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::InitDb { config } => run_init_db(&config),
        Command::AddUser { config, username } => run_add_user(&config, &username),
        Command::Quote { config, symbol } => run_quote(&config, &symbol),
        Command::GenSecret => run_gen_secret(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn open_store(config: &dyn ConfigPort) -> Result<SqliteAdapter, ExitCode> {
    let store = SqliteAdapter::from_config(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    store.initialize_schema().map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    Ok(store)
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    init_tracing();

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let quotes = match IexAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let listen = config
        .get_string("server", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    let addr: SocketAddr = match listen.parse() {
        Ok(a) => a,
        Err(_) => {
            let err = PapertradeError::ConfigInvalid {
                section: "server".to_string(),
                key: "listen".to_string(),
                reason: format!("\"{listen}\" is not a host:port address"),
            };
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
    };

    let state = AppState {
        store: Arc::new(store),
        quotes: Arc::new(quotes),
        config: Arc::new(config),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(async move {
        let router = match build_router(state).await {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };

        eprintln!("Listening on http://{addr}");
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(1);
            }
        };
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
        ExitCode::SUCCESS
    })
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(code) = open_store(&config) {
        return code;
    }

    let path = config
        .get_string("database", "path")
        .unwrap_or_else(|| "?".to_string());
    eprintln!("Initialized database at {path}");
    ExitCode::SUCCESS
}

fn run_add_user(config_path: &PathBuf, username: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let username = username.trim();
    if username.is_empty() {
        let err = PapertradeError::validation("username must not be blank");
        eprintln!("error: {err}");
        return ExitCode::from(&err);
    }

    eprintln!("Enter password for {username}:");
    let stdin = io::stdin();
    let password = match stdin.lock().lines().next() {
        Some(Ok(line)) => line,
        Some(Err(e)) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
        None => String::new(),
    };

    if let Err(e) = PasswordPolicy::from_config(&config).validate(&password) {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }

    let hash = match hash_password(&password) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: password hashing failed: {e}");
            return ExitCode::from(1);
        }
    };

    let cash = match starting_cash(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    match store.create_user(username, &hash, cash) {
        Ok(user) => {
            println!("Created user {} with {}", user.username, usd(user.cash));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_quote(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbol = match normalize_symbol(symbol) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let quotes = match IexAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(async move {
        match quotes.lookup(&symbol).await {
            Ok(Some(quote)) => {
                println!("{} ({}): {}", quote.name, quote.symbol, usd(quote.price));
                ExitCode::SUCCESS
            }
            Ok(None) => {
                let err = PapertradeError::InvalidSymbol { symbol };
                eprintln!("error: {err}");
                ExitCode::from(&err)
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            }
        }
    })
}

fn run_gen_secret() -> ExitCode {
    use rand::RngCore;

    let mut secret = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut secret);
    println!("{}", hex::encode(secret));
    ExitCode::SUCCESS
}
