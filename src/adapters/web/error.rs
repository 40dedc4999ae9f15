//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use askama::Template;

use crate::domain::error::PapertradeError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<PapertradeError> for WebError {
    fn from(err: PapertradeError) -> Self {
        let status = match &err {
            PapertradeError::Validation { .. } | PapertradeError::InvalidQuantity { .. } => {
                StatusCode::BAD_REQUEST
            }
            PapertradeError::InvalidSymbol { .. }
            | PapertradeError::InsufficientFunds { .. }
            | PapertradeError::NoSuchHolding { .. }
            | PapertradeError::InsufficientShares { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PapertradeError::DuplicateUsername { .. }
            | PapertradeError::WeakPassword { .. }
            | PapertradeError::PasswordMismatch => StatusCode::BAD_REQUEST,
            PapertradeError::InvalidCredentials => StatusCode::FORBIDDEN,
            PapertradeError::QuoteUnavailable { .. } => StatusCode::BAD_GATEWAY,
            PapertradeError::Database { .. }
            | PapertradeError::DatabaseQuery { .. }
            | PapertradeError::ConfigParse { .. }
            | PapertradeError::ConfigMissing { .. }
            | PapertradeError::ConfigInvalid { .. }
            | PapertradeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Infrastructure detail stays in the logs, not on the page.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
            Self::new(status, "something went wrong on our side")
        } else {
            Self::new(status, err.to_string())
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
