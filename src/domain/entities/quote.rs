use crate::domain::errors::FeedError;
use crate::domain::value_objects::price::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest known market quote for a symbol. One current value per symbol;
/// newer quotes replace older ones wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Price,
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, price: Price, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            observed_at,
        }
    }

    /// Parses a feed frame of the form
    /// `{"symbol": "ABC", "price": 5.0, "time": 1700000000}`.
    /// Price may arrive as a JSON number or a numeric string; a missing or
    /// invalid time falls back to the receive time.
    pub fn from_frame(data: &serde_json::Value) -> Result<Quote, FeedError> {
        let symbol = data["symbol"]
            .as_str()
            .ok_or_else(|| FeedError::FrameParse("missing symbol".to_string()))?
            .to_string();
        let raw_price = match &data["price"] {
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| FeedError::FrameParse("price out of range".to_string()))?,
            serde_json::Value::String(s) => s.parse::<f64>().map_err(|_| {
                FeedError::FrameParse(format!("non-numeric price '{}'", s))
            })?,
            _ => return Err(FeedError::FrameParse("missing price".to_string())),
        };
        let price =
            Price::new(raw_price).map_err(|e| FeedError::FrameParse(e.to_string()))?;
        let observed_at = data["time"]
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol,
            price,
            observed_at,
        })
    }
}
