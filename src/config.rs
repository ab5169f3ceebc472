use std::net::SocketAddr;

/// Service configuration: HTTP bind address, market feed connection and
/// notification endpoint, plus channel sizing for the internal queues.
/// Defaults are development values; each field can be overridden through
/// the environment (`FOLIO_*`).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub feed_url: String,
    pub feed_symbols: Vec<String>,
    pub notice_endpoint: String,
    pub projection_capacity: usize,
    pub publisher_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            feed_url: "ws://127.0.0.1:9001/quotes".to_string(),
            feed_symbols: vec![
                "ABC".to_string(),
                "DEF".to_string(),
                "GHI".to_string(),
            ],
            notice_endpoint: "http://127.0.0.1:9002/account".to_string(),
            projection_capacity: 256,
            publisher_capacity: 64,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("FOLIO_BIND_ADDR") {
            match value.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => tracing::warn!("Ignoring invalid FOLIO_BIND_ADDR: {}", value),
            }
        }
        if let Ok(value) = std::env::var("FOLIO_FEED_URL") {
            config.feed_url = value;
        }
        if let Ok(value) = std::env::var("FOLIO_FEED_SYMBOLS") {
            config.feed_symbols = Self::parse_symbols(&value);
        }
        if let Ok(value) = std::env::var("FOLIO_NOTICE_ENDPOINT") {
            config.notice_endpoint = value;
        }
        if let Some(n) = Self::parse_capacity("FOLIO_PROJECTION_CAPACITY") {
            config.projection_capacity = n;
        }
        if let Some(n) = Self::parse_capacity("FOLIO_PUBLISHER_CAPACITY") {
            config.publisher_capacity = n;
        }

        config
    }

    /// Channel capacities must be positive; zero or garbage keeps the
    /// default.
    fn parse_capacity(var: &str) -> Option<usize> {
        let value = std::env::var(var).ok()?;
        match value.parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                tracing::warn!("Ignoring invalid {}: {}", var, value);
                None
            }
        }
    }

    fn parse_symbols(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
