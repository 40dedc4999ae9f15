#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use papertrade::adapters::sqlite_adapter::SqliteAdapter;
use papertrade::adapters::web::{build_router, AppState};
use papertrade::domain::error::PapertradeError;
use papertrade::domain::quote::Quote;
use papertrade::ports::quote_port::QuotePort;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TEST_USERNAME: &str = "alice";
pub const TEST_PASSWORD: &str = "Passw0rd!";

const TEST_CONFIG: &str = "\
[database]
path = :memory:

[auth]
session_secret = 0101010101010101010101010101010101010101010101010101010101010101\
0101010101010101010101010101010101010101010101010101010101010101
session_lifetime = 86400

[trading]
starting_cash = 10000.0
";

/// In-memory quote source. Prices can be changed mid-test to simulate
/// market movement between a buy and a sell.
pub struct MockQuotePort {
    quotes: Mutex<HashMap<String, Quote>>,
    unavailable: Mutex<bool>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            quotes: Mutex::new(HashMap::new()),
            unavailable: Mutex::new(false),
        }
    }

    pub fn with_quote(self, symbol: &str, name: &str, price: f64) -> Self {
        self.quotes.lock().unwrap().insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
            },
        );
        self
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        let mut quotes = self.quotes.lock().unwrap();
        if let Some(quote) = quotes.get_mut(symbol) {
            quote.price = price;
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl QuotePort for MockQuotePort {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, PapertradeError> {
        if *self.unavailable.lock().unwrap() {
            return Err(PapertradeError::QuoteUnavailable {
                reason: "mock outage".to_string(),
            });
        }
        Ok(self.quotes.lock().unwrap().get(symbol).cloned())
    }
}

pub fn default_quotes() -> MockQuotePort {
    MockQuotePort::new()
        .with_quote("AAPL", "Apple Inc", 150.0)
        .with_quote("NFLX", "Netflix Inc", 45.50)
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteAdapter>,
    pub quotes: Arc<MockQuotePort>,
}

pub async fn build_app(quotes: MockQuotePort) -> TestApp {
    let store = Arc::new(SqliteAdapter::in_memory().unwrap());
    store.initialize_schema().unwrap();
    let quotes = Arc::new(quotes);

    let config = papertrade::adapters::file_config_adapter::FileConfigAdapter::from_string(
        TEST_CONFIG,
    )
    .unwrap();
    let state = AppState {
        store: store.clone(),
        quotes: quotes.clone(),
        config: Arc::new(config),
    };
    let router = build_router(state).await.unwrap();

    TestApp {
        router,
        store,
        quotes,
    }
}

pub fn extract_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

pub fn build_cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .map(|sc| sc.split(';').next().unwrap_or("").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn form_post(uri: &str, cookies: &str, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

pub fn get(uri: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

/// Register a user through the form and hand back the session cookie
/// header for follow-up requests.
pub async fn register_user(router: &Router, username: &str, password: &str) -> String {
    let response = router
        .clone()
        .oneshot(form_post(
            "/register",
            "",
            &format!("username={username}&password={password}&confirmation={password}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    build_cookie_header(&extract_cookies(&response))
}

pub async fn login_user(router: &Router, username: &str, password: &str) -> String {
    let response = router
        .clone()
        .oneshot(form_post(
            "/login",
            "",
            &format!("username={username}&password={password}"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    build_cookie_header(&extract_cookies(&response))
}
