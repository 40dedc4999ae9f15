//! Web server adapter.
//!
//! Serves the trading UI over Axum: server-rendered askama templates,
//! session-backed logins via axum-login, and form posts for every
//! mutation. Sessions are signed cookies whose state lives in the same
//! SQLite file as the ledger.

mod auth;
mod error;
mod flash;
mod handlers;
mod templates;

pub use auth::{hash_password, verify_password, AuthSession, Backend, Credentials};
pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use axum_login::{login_required, AuthManagerLayerBuilder};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::Key, Expiry, SessionManagerLayer};
use tower_sessions_rusqlite_store::RusqliteStore;

use crate::domain::error::PapertradeError;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;
use crate::ports::store_port::StorePort;

const DEFAULT_SESSION_LIFETIME_SECS: i64 = 86_400;

pub struct AppState {
    pub store: Arc<dyn StorePort + Send + Sync>,
    pub quotes: Arc<dyn QuotePort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

/// Decode the session signing key from config. The secret is 64 bytes of
/// hex, as produced by `gen-secret`.
fn session_key(config: &dyn ConfigPort) -> Result<Key, PapertradeError> {
    let secret = config.require_string("auth", "session_secret")?;
    let bytes = hex::decode(secret.trim()).map_err(|e| PapertradeError::ConfigInvalid {
        section: "auth".to_string(),
        key: "session_secret".to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() != 64 {
        return Err(PapertradeError::ConfigInvalid {
            section: "auth".to_string(),
            key: "session_secret".to_string(),
            reason: format!("expected 64 bytes of hex, got {}", bytes.len()),
        });
    }
    Ok(Key::from(&bytes))
}

async fn session_store(config: &dyn ConfigPort) -> Result<RusqliteStore, PapertradeError> {
    let path = config.require_string("database", "path")?;
    let conn = tokio_rusqlite::Connection::open(&path)
        .await
        .map_err(|e| PapertradeError::Database {
            reason: format!("opening session store: {e}"),
        })?;
    let store = RusqliteStore::new(conn);
    store.migrate().await.map_err(|e| PapertradeError::Database {
        reason: format!("migrating session store: {e}"),
    })?;
    Ok(store)
}

pub async fn build_router(state: AppState) -> Result<Router, PapertradeError> {
    let key = session_key(state.config.as_ref())?;
    let lifetime = state
        .config
        .get_int("auth", "session_lifetime", DEFAULT_SESSION_LIFETIME_SECS)
        .max(1);

    let session_layer = SessionManagerLayer::new(session_store(state.config.as_ref()).await?)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(lifetime)))
        .with_signed(key);
    let auth_layer =
        AuthManagerLayerBuilder::new(Backend::new(state.store.clone()), session_layer).build();

    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/buy", get(handlers::buy_form).post(handlers::buy))
        .route("/sell", get(handlers::sell_form).post(handlers::sell))
        .route("/quote", get(handlers::quote_form).post(handlers::quote))
        .route("/history", get(handlers::history))
        .route_layer(login_required!(Backend, login_url = "/login"))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    Ok(router)
}
