//! Domain error types.

/// Top-level error type for papertrade.
///
/// Variants group into: malformed input (`Validation`, `InvalidQuantity`),
/// business rules (`InvalidSymbol` through `InsufficientShares`), account and
/// credential failures (`DuplicateUsername` through `PasswordMismatch`), the
/// quote service (`QuoteUnavailable`), and infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum PapertradeError {
    #[error("{reason}")]
    Validation { reason: String },

    #[error("\"{input}\" is not a whole, positive number of shares")]
    InvalidQuantity { input: String },

    #[error("{symbol} is not a valid stock symbol")]
    InvalidSymbol { symbol: String },

    #[error("insufficient funds: this trade costs ${needed:.2} but only ${available:.2} is available")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("no shares of {symbol} held")]
    NoSuchHolding { symbol: String },

    #[error("cannot sell {requested} shares of {symbol}: only {held} held")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("the username {username} is already taken")]
    DuplicateUsername { username: String },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("password too weak: {reason}")]
    WeakPassword { reason: String },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("quote service unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PapertradeError {
    /// Shorthand for a plain validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        PapertradeError::Validation {
            reason: reason.into(),
        }
    }
}

impl From<&PapertradeError> for std::process::ExitCode {
    fn from(err: &PapertradeError) -> Self {
        let code: u8 = match err {
            PapertradeError::Io(_) => 1,
            PapertradeError::ConfigParse { .. }
            | PapertradeError::ConfigMissing { .. }
            | PapertradeError::ConfigInvalid { .. } => 2,
            PapertradeError::Database { .. } | PapertradeError::DatabaseQuery { .. } => 3,
            PapertradeError::Validation { .. }
            | PapertradeError::InvalidQuantity { .. }
            | PapertradeError::DuplicateUsername { .. }
            | PapertradeError::InvalidCredentials
            | PapertradeError::WeakPassword { .. }
            | PapertradeError::PasswordMismatch => 4,
            PapertradeError::InvalidSymbol { .. }
            | PapertradeError::InsufficientFunds { .. }
            | PapertradeError::NoSuchHolding { .. }
            | PapertradeError::InsufficientShares { .. }
            | PapertradeError::QuoteUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
