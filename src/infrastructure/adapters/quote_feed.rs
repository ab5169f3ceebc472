//! Quote Cache and Feed Actor
//!
//! The cache is the process-wide "latest known price per symbol" view.
//! Reads only touch local state; the feed task pushes whole-quote
//! replacements in from the market-data websocket, last-writer-wins.

use crate::domain::entities::quote::Quote;
use crate::domain::errors::FeedError;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Latest quote per symbol, safe for concurrent readers.
pub struct QuoteCache {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self {
            quotes: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the current quote for the symbol. No merging; the newest
    /// write wins.
    pub async fn insert(&self, quote: Quote) {
        let mut quotes = self.quotes.write().await;
        quotes.insert(quote.symbol.clone(), quote);
    }

    pub async fn get(&self, symbol: &str) -> Option<Quote> {
        let quotes = self.quotes.read().await;
        quotes.get(symbol).cloned()
    }

    /// Snapshot of the whole cache at call time. Weakly consistent with
    /// respect to concurrent feed writes.
    pub async fn all(&self) -> Vec<Quote> {
        let quotes = self.quotes.read().await;
        quotes.values().cloned().collect()
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Websocket task feeding the quote cache from the external market feed.
pub struct QuoteFeedActor {
    url: String,
    symbols: Vec<String>,
    cache: Arc<QuoteCache>,
}

impl QuoteFeedActor {
    /// Spawn the feed task. Returns the shutdown handle; sending on it
    /// stops the task and any reconnect in progress.
    pub fn spawn(url: String, symbols: Vec<String>, cache: Arc<QuoteCache>) -> broadcast::Sender<()> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let actor = Self {
            url,
            symbols,
            cache,
        };

        tokio::spawn(async move {
            actor.run(shutdown_rx).await;
        });

        shutdown_tx
    }

    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut backoff = Duration::from_secs(1);
        let max_backoff = Duration::from_secs(60);

        loop {
            info!("Connecting to quote feed at {}", self.url);

            tokio::select! {
                result = self.try_connection() => {
                    match result {
                        Ok(()) => {
                            info!("Quote feed connection ended normally, reconnecting...");
                            backoff = Duration::from_secs(1);
                        }
                        Err(e) => {
                            error!("Quote feed error: {}, retrying in {:?}", e, backoff);
                        }
                    }

                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {
                            backoff = (backoff * 2).min(max_backoff);
                        }
                        _ = shutdown_rx.recv() => {
                            info!("Quote feed task received shutdown signal");
                            return;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Quote feed task received shutdown signal");
                    return;
                }
            }
        }
    }

    async fn try_connection(&self) -> Result<(), FeedError> {
        let (stream, _) = connect_async(&self.url)
            .await
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;
        info!("Connected to quote feed");

        let (mut write, mut read) = stream.split();

        write
            .send(Message::Text(Self::subscribe_frame(&self.symbols)))
            .await
            .map_err(|e| FeedError::WebSocket(e.to_string()))?;
        debug!("Subscribed to {} symbols", self.symbols.len());

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(data) => match Quote::from_frame(&data) {
                        Ok(quote) => {
                            debug!(
                                "Quote update for {}: {:.2}",
                                quote.symbol,
                                quote.price.value()
                            );
                            self.cache.insert(quote).await;
                        }
                        Err(e) => {
                            warn!("Dropping quote frame {}: {}", text, e);
                        }
                    },
                    Err(_) => {
                        warn!("Received invalid JSON from quote feed: {}", text);
                    }
                },
                Ok(Message::Ping(payload)) => {
                    write
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| FeedError::WebSocket(e.to_string()))?;
                }
                Ok(Message::Close(frame)) => {
                    info!("Quote feed connection closed: {:?}", frame);
                    return Ok(());
                }
                Ok(other) => {
                    debug!("Ignoring quote feed message: {:?}", other);
                }
                Err(e) => {
                    return Err(FeedError::WebSocket(e.to_string()));
                }
            }
        }

        info!("Quote feed stream ended");
        Ok(())
    }

    fn subscribe_frame(symbols: &[String]) -> String {
        serde_json::json!({
            "type": "subscribe",
            "symbols": symbols,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::price::Price;
    use chrono::Utc;

    fn quote(symbol: &str, price: f64) -> Quote {
        Quote::new(symbol, Price::new(price).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn test_cache_get_missing_symbol() {
        let cache = QuoteCache::new();
        assert!(cache.get("ZZZ").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_insert_then_get() {
        let cache = QuoteCache::new();
        cache.insert(quote("ABC", 5.0)).await;

        let found = cache.get("ABC").await.unwrap();
        assert_eq!(found.symbol, "ABC");
        assert_eq!(found.price.value(), 5.0);
    }

    #[tokio::test]
    async fn test_cache_last_writer_wins() {
        let cache = QuoteCache::new();
        cache.insert(quote("ABC", 5.0)).await;
        cache.insert(quote("ABC", 6.0)).await;

        assert_eq!(cache.get("ABC").await.unwrap().price.value(), 6.0);
        assert_eq!(cache.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_all_only_updated_symbols() {
        let cache = QuoteCache::new();
        assert!(cache.all().await.is_empty());

        cache.insert(quote("ABC", 5.0)).await;
        cache.insert(quote("DEF", 7.0)).await;

        let mut symbols: Vec<String> =
            cache.all().await.into_iter().map(|q| q.symbol).collect();
        symbols.sort();
        assert_eq!(symbols, vec!["ABC", "DEF"]);
    }

    #[test]
    fn test_subscribe_frame() {
        let frame = QuoteFeedActor::subscribe_frame(&["ABC".to_string(), "DEF".to_string()]);
        let data: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(data["type"], "subscribe");
        assert_eq!(data["symbols"][0], "ABC");
        assert_eq!(data["symbols"][1], "DEF");
    }
}
