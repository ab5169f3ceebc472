use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by the portfolio orchestration layer.
///
/// `PortfolioNotFound` and `QuoteUnavailable` are normal negative results
/// and map to a not-found response; the channel variants indicate that a
/// portfolio actor went away or stopped responding.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum PortfolioError {
    #[error("Portfolio not found: {0}")]
    PortfolioNotFound(String),

    #[error("No quote available for symbol: {symbol}")]
    QuoteUnavailable { symbol: String },

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("No response received from portfolio actor")]
    NoResponse,

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl<T> From<mpsc::error::SendError<T>> for PortfolioError {
    fn from(e: mpsc::error::SendError<T>) -> Self {
        PortfolioError::ChannelSend(e.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Price must be non-negative")]
    NegativePrice,

    #[error("Quantity must be non-negative")]
    NegativeQuantity,

    #[error("Value must be finite")]
    MustBeFinite,

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

impl From<ValidationError> for PortfolioError {
    fn from(error: ValidationError) -> Self {
        PortfolioError::InvalidInput(error.to_string())
    }
}

#[derive(Debug, Error, Clone)]
pub enum FeedError {
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Failed to parse quote frame: {0}")]
    FrameParse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portfolio_not_found_display() {
        let err = PortfolioError::PortfolioNotFound("p1".to_string());
        assert_eq!(err.to_string(), "Portfolio not found: p1");
    }

    #[test]
    fn test_quote_unavailable_display() {
        let err = PortfolioError::QuoteUnavailable {
            symbol: "ABC".to_string(),
        };
        assert_eq!(err.to_string(), "No quote available for symbol: ABC");
    }

    #[test]
    fn test_validation_error_converts_to_invalid_input() {
        let err: PortfolioError = ValidationError::NegativeQuantity.into();
        assert!(matches!(err, PortfolioError::InvalidInput(_)));
    }

    #[test]
    fn test_portfolio_error_serializes_with_tag() {
        let err = PortfolioError::QuoteUnavailable {
            symbol: "ABC".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "QuoteUnavailable");
    }
}
