use crate::application::actors::portfolio_actor::{PortfolioActor, PortfolioMessage};
use crate::domain::entities::portfolio::PortfolioSnapshot;
use crate::domain::entities::quote::Quote;
use crate::domain::errors::{PortfolioError, ValidationError};
use crate::domain::value_objects::quantity::Quantity;
use crate::infrastructure::adapters::acquisition_publisher::AcquisitionPublisher;
use crate::infrastructure::adapters::quote_feed::QuoteCache;
use crate::infrastructure::persistence::query_store::QueryStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::{info, warn};

/// Channel reply timeout duration (5 seconds)
const CHANNEL_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Validate stock symbol format
///
/// Symbols must be:
/// - Non-empty and max 20 characters
/// - Contain only alphanumeric, hyphens, underscores, or dots
fn validate_symbol(symbol: &str) -> Result<(), PortfolioError> {
    if symbol.is_empty() || symbol.len() > 20 {
        return Err(ValidationError::InvalidSymbol(format!(
            "'{}' must be 1-20 characters",
            symbol
        ))
        .into());
    }

    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidSymbol(format!(
            "'{}' may only contain alphanumeric, -, _, .",
            symbol
        ))
        .into());
    }

    Ok(())
}

fn validate_owner(owner: &str) -> Result<(), PortfolioError> {
    if owner.trim().is_empty() || owner.len() > 64 {
        return Err(PortfolioError::InvalidInput(format!(
            "Invalid owner: '{}' (must be 1-64 non-blank characters)",
            owner
        )));
    }
    Ok(())
}

/// Request orchestrator. Routes every write to the single portfolio actor
/// owning the identity, answers reads from the query store and the quote
/// cache, and hands completed acquisitions to the publisher.
pub struct PortfolioService {
    portfolios: Mutex<HashMap<String, mpsc::Sender<PortfolioMessage>>>,
    quotes: Arc<QuoteCache>,
    publisher: AcquisitionPublisher,
    queries: Arc<QueryStore>,
    projection_tx: mpsc::Sender<PortfolioSnapshot>,
}

impl PortfolioService {
    pub fn new(
        quotes: Arc<QuoteCache>,
        publisher: AcquisitionPublisher,
        queries: Arc<QueryStore>,
        projection_tx: mpsc::Sender<PortfolioSnapshot>,
    ) -> Self {
        Self {
            portfolios: Mutex::new(HashMap::new()),
            quotes,
            publisher,
            queries,
            projection_tx,
        }
    }

    fn next_portfolio_id() -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::random();
        format!("portfolio_{}_{:08x}", millis, suffix)
    }

    /// Spawn and register the actor for a freshly generated identity.
    /// At most one actor per identity can ever be live: the registry lock
    /// covers the spawn.
    async fn register(&self, id: &str) -> mpsc::Sender<PortfolioMessage> {
        let mut portfolios = self.portfolios.lock().await;
        portfolios
            .entry(id.to_string())
            .or_insert_with(|| PortfolioActor::spawn(id.to_string(), self.projection_tx.clone()))
            .clone()
    }

    /// Look up the actor for an existing identity. Never spawns: an
    /// identity this service has not created has no actor, and commands
    /// against it must not leave one behind.
    async fn resolve(&self, id: &str) -> Result<mpsc::Sender<PortfolioMessage>, PortfolioError> {
        self.portfolios
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PortfolioError::PortfolioNotFound(id.to_string()))
    }

    async fn await_reply(
        &self,
        reply_rx: &mut mpsc::Receiver<Result<PortfolioSnapshot, PortfolioError>>,
    ) -> Result<PortfolioSnapshot, PortfolioError> {
        timeout(CHANNEL_REPLY_TIMEOUT, reply_rx.recv())
            .await
            .map_err(|_| PortfolioError::Timeout)?
            .ok_or(PortfolioError::NoResponse)?
    }

    /// Create a new portfolio under a fresh identity.
    pub async fn create_portfolio(&self, owner: &str) -> Result<PortfolioSnapshot, PortfolioError> {
        validate_owner(owner)?;

        let id = Self::next_portfolio_id();
        let sender = self.register(&id).await;

        let (reply_tx, mut reply_rx) = mpsc::channel(1);
        sender
            .send(PortfolioMessage::Create {
                owner: owner.to_string(),
                reply: reply_tx,
            })
            .await?;

        let snapshot = self.await_reply(&mut reply_rx).await?;
        info!("Created portfolio {} for owner {}", snapshot.id, snapshot.owner);
        Ok(snapshot)
    }

    /// Current read-model view of a portfolio. Eventually consistent with
    /// the write path; an identity the projector has not seen is NotFound.
    pub async fn portfolio_of(&self, id: &str) -> Result<PortfolioSnapshot, PortfolioError> {
        self.queries
            .portfolio_of(id)
            .await
            .ok_or_else(|| PortfolioError::PortfolioNotFound(id.to_string()))
    }

    /// Buy `amount` units of `symbol` at the currently cached quote.
    ///
    /// The quote is the precondition: without one the command is rejected
    /// before the entity is touched, so portfolio state never changes.
    /// On success the purchase value goes to the publisher fire-and-forget.
    pub async fn acquire_stock(
        &self,
        id: &str,
        symbol: &str,
        amount: f64,
    ) -> Result<PortfolioSnapshot, PortfolioError> {
        validate_symbol(symbol)?;
        let amount = Quantity::new(amount)?;

        let quote = self
            .quotes
            .get(symbol)
            .await
            .ok_or_else(|| PortfolioError::QuoteUnavailable {
                symbol: symbol.to_string(),
            })?;

        let sender = self.resolve(id).await?;
        let (reply_tx, mut reply_rx) = mpsc::channel(1);
        sender
            .send(PortfolioMessage::AcquireStock {
                symbol: symbol.to_string(),
                observed_at: quote.observed_at,
                amount,
                price: quote.price,
                reply: reply_tx,
            })
            .await?;

        let snapshot = self.await_reply(&mut reply_rx).await?;

        // Notification is decoupled from the request outcome
        self.publisher
            .publish(&snapshot.owner, quote.price.times(amount));

        info!(
            "Portfolio {} acquired {} x{} at {:.2}",
            snapshot.id,
            symbol,
            amount.value(),
            quote.price.value()
        );
        Ok(snapshot)
    }

    /// Latest quote for a symbol, from local cache only.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, PortfolioError> {
        self.quotes
            .get(symbol)
            .await
            .ok_or_else(|| PortfolioError::QuoteUnavailable {
                symbol: symbol.to_string(),
            })
    }

    /// All currently cached quotes. An empty cache is an empty list, not
    /// an error.
    pub async fn quotes(&self) -> Vec<Quote> {
        self.quotes.all().await
    }

    /// Stop every portfolio actor. Called after the HTTP server drains.
    pub async fn shutdown(&self) {
        let mut portfolios = self.portfolios.lock().await;
        for (id, sender) in portfolios.drain() {
            if sender.send(PortfolioMessage::Shutdown).await.is_err() {
                warn!("Portfolio actor {} already stopped", id);
            }
        }
        info!("All portfolio actors shut down");
    }
}
