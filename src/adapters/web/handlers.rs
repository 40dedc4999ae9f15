//! HTTP request handlers for the web adapter.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;
use tower_sessions::Session;

use crate::domain::error::PapertradeError;
use crate::domain::money::usd;
use crate::domain::password::PasswordPolicy;
use crate::domain::portfolio::value_portfolio;
use crate::domain::quote::{normalize_symbol, Quote};
use crate::domain::trade::{parse_quantity, starting_cash};
use crate::domain::user::User;
use crate::ports::quote_port::QuotePort;

use super::auth::{hash_password, AuthSession, Credentials};
use super::flash::{set_flash, take_flash};
use super::templates::{self, render, HistoryRow, PositionRow};
use super::{AppState, WebError};

/// The user behind this request. Protected routes sit behind the login
/// layer, so a missing user here means the layering is wrong, not the
/// visitor.
fn current_user(auth_session: &AuthSession) -> Result<&User, WebError> {
    auth_session
        .user
        .as_ref()
        .ok_or_else(|| WebError::new(StatusCode::UNAUTHORIZED, "not logged in"))
}

fn shares_noun(quantity: i64) -> &'static str {
    if quantity == 1 { "share" } else { "shares" }
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

async fn lookup_or_invalid(
    quotes: &(dyn QuotePort + Send + Sync),
    symbol: &str,
) -> Result<Quote, WebError> {
    match quotes.lookup(symbol).await? {
        Some(quote) => Ok(quote),
        None => Err(PapertradeError::InvalidSymbol {
            symbol: symbol.to_string(),
        }
        .into()),
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TradeForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
}

fn parse_trade_form(form: &TradeForm) -> Result<(String, i64), WebError> {
    if form.symbol.trim().is_empty() {
        return Err(PapertradeError::validation("must provide a stock symbol").into());
    }
    let symbol = normalize_symbol(&form.symbol)?;
    let quantity = parse_quantity(&form.shares)?;
    Ok((symbol, quantity))
}

pub async fn index(
    auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let holdings = state.store.holdings(user.id)?;

    let mut priced = Vec::with_capacity(holdings.len());
    for holding in holdings {
        let quote = match state.quotes.lookup(&holding.symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!(symbol = %holding.symbol, error = %e, "portfolio quote lookup failed");
                None
            }
        };
        priced.push((holding, quote));
    }

    let view = value_portfolio(user.cash, priced);
    let positions: Vec<PositionRow> =
        view.positions.into_iter().map(PositionRow::from).collect();
    let cash = usd(view.cash);
    let holdings_value = usd(view.holdings_value);
    let net_worth = usd(view.net_worth);
    let flash = take_flash(&session).await;

    let template = templates::PortfolioTemplate {
        username: Some(&user.username),
        flash: flash.as_deref(),
        positions: &positions,
        cash: &cash,
        holdings_value: &holdings_value,
        net_worth: &net_worth,
        complete: view.complete,
    };
    Ok(render(&template)?.into_response())
}

pub async fn buy_form(
    auth_session: AuthSession,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let flash = take_flash(&session).await;
    let template = templates::BuyTemplate {
        username: Some(&user.username),
        flash: flash.as_deref(),
    };
    Ok(render(&template)?.into_response())
}

pub async fn buy(
    auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let (symbol, quantity) = parse_trade_form(&form)?;

    let quote = lookup_or_invalid(state.quotes.as_ref(), &symbol).await?;
    let plan = state.store.buy(user.id, &symbol, quantity, quote.price)?;

    tracing::info!(
        user = user.id,
        symbol = %symbol,
        quantity,
        price = quote.price,
        "buy executed"
    );
    set_flash(
        &session,
        format!(
            "Bought {} {} of {} for {}.",
            plan.quantity,
            shares_noun(plan.quantity),
            quote.name,
            usd(plan.total_cost)
        ),
    )
    .await;
    Ok(Redirect::to("/").into_response())
}

pub async fn sell_form(
    auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let symbols: Vec<String> = state
        .store
        .holdings(user.id)?
        .into_iter()
        .map(|h| h.symbol)
        .collect();
    let flash = take_flash(&session).await;

    let template = templates::SellTemplate {
        username: Some(&user.username),
        flash: flash.as_deref(),
        symbols: &symbols,
    };
    Ok(render(&template)?.into_response())
}

pub async fn sell(
    auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let (symbol, quantity) = parse_trade_form(&form)?;

    // Holding checks come before the quote lookup, so selling shares you
    // do not have reports that even when the quote source is down. The
    // store re-checks inside its transaction.
    let held = match state.store.holding(user.id, &symbol)? {
        Some(holding) => holding.shares,
        None => return Err(PapertradeError::NoSuchHolding { symbol }.into()),
    };
    if quantity > held {
        return Err(PapertradeError::InsufficientShares {
            symbol,
            requested: quantity,
            held,
        }
        .into());
    }

    let quote = lookup_or_invalid(state.quotes.as_ref(), &symbol).await?;
    let plan = state.store.sell(user.id, &symbol, quantity, quote.price)?;

    tracing::info!(
        user = user.id,
        symbol = %symbol,
        quantity,
        price = quote.price,
        "sell executed"
    );
    set_flash(
        &session,
        format!(
            "Sold {} {} of {} for {}.",
            plan.quantity,
            shares_noun(plan.quantity),
            quote.name,
            usd(plan.proceeds)
        ),
    )
    .await;
    Ok(Redirect::to("/").into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub symbol: String,
}

pub async fn quote_form(
    auth_session: AuthSession,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let flash = take_flash(&session).await;
    let template = templates::QuoteFormTemplate {
        username: Some(&user.username),
        flash: flash.as_deref(),
    };
    Ok(render(&template)?.into_response())
}

pub async fn quote(
    auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<QuoteForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    if form.symbol.trim().is_empty() {
        return Err(PapertradeError::validation("must provide a stock symbol").into());
    }
    let symbol = normalize_symbol(&form.symbol)?;
    let quote = lookup_or_invalid(state.quotes.as_ref(), &symbol).await?;

    let price = usd(quote.price);
    let flash = take_flash(&session).await;
    let template = templates::QuotedTemplate {
        username: Some(&user.username),
        flash: flash.as_deref(),
        symbol: &quote.symbol,
        name: &quote.name,
        price: &price,
    };
    Ok(render(&template)?.into_response())
}

pub async fn history(
    auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
) -> Result<Response, WebError> {
    let user = current_user(&auth_session)?;
    let entries: Vec<HistoryRow> = state
        .store
        .history(user.id)?
        .iter()
        .map(HistoryRow::from)
        .collect();
    let flash = take_flash(&session).await;

    let template = templates::HistoryTemplate {
        username: Some(&user.username),
        flash: flash.as_deref(),
        entries: &entries,
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn login_form(
    session: Session,
    Query(query): Query<NextQuery>,
) -> Result<Response, WebError> {
    let flash = take_flash(&session).await;
    let template = templates::LoginTemplate {
        username: None,
        flash: flash.as_deref(),
        error: None,
        next: query.next.as_deref(),
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

fn login_failure(message: &str, next: Option<&str>) -> Result<Response, WebError> {
    let template = templates::LoginTemplate {
        username: None,
        flash: None,
        error: Some(message),
        next,
    };
    Ok((StatusCode::FORBIDDEN, render(&template)?).into_response())
}

pub async fn login(
    mut auth_session: AuthSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return login_failure("must provide username and password", form.next.as_deref());
    }

    let creds = Credentials {
        username: username.to_string(),
        password: form.password.clone(),
    };
    let user = match auth_session.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(username, "rejected login");
            return login_failure(
                &PapertradeError::InvalidCredentials.to_string(),
                form.next.as_deref(),
            );
        }
        Err(e) => return Err(WebError::internal(format!("authentication failed: {e}"))),
    };

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(format!("session login failed: {e}")))?;
    tracing::info!(who = %user.describe(), "logged in");
    Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Response, WebError> {
    if let Some(user) = &auth_session.user {
        tracing::info!(who = %user.describe(), "logged out");
    }
    let _ = auth_session
        .logout()
        .await
        .map_err(|e| WebError::internal(format!("logout failed: {e}")))?;
    Ok(Redirect::to("/login").into_response())
}

pub async fn register_form(session: Session) -> Result<Response, WebError> {
    let flash = take_flash(&session).await;
    let template = templates::RegisterTemplate {
        username: None,
        flash: flash.as_deref(),
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

pub async fn register(
    mut auth_session: AuthSession,
    session: Session,
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(PapertradeError::validation("must provide a username").into());
    }
    if form.password.is_empty() {
        return Err(PapertradeError::validation("must provide a password").into());
    }
    if form.confirmation.is_empty() {
        return Err(PapertradeError::validation("must confirm the password").into());
    }
    if form.password != form.confirmation {
        return Err(PapertradeError::PasswordMismatch.into());
    }
    PasswordPolicy::from_config(state.config.as_ref()).validate(&form.password)?;

    let hash = hash_password(&form.password)
        .map_err(|e| WebError::internal(format!("password hashing failed: {e}")))?;
    let cash = starting_cash(state.config.as_ref())?;
    let user = state.store.create_user(username, &hash, cash)?;
    tracing::info!(who = %user.describe(), "registered");

    auth_session
        .login(&user)
        .await
        .map_err(|e| WebError::internal(format!("session login failed: {e}")))?;
    set_flash(&session, "Registered!").await;
    Ok(Redirect::to("/").into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such page")
}
