//! Portfolio Actor
//!
//! This module implements the actor pattern for portfolios. Each portfolio
//! identity gets its own async task with an ordered inbox, which gives:
//! - Serialized mutation per identity (commands never interleave)
//! - Full parallelism across different identities
//! - Clean separation of state ownership from request orchestration

use crate::domain::entities::portfolio::{PortfolioSnapshot, PortfolioState};
use crate::domain::errors::PortfolioError;
use crate::domain::value_objects::{price::Price, quantity::Quantity};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Messages that can be sent to a portfolio actor. Commands against the
/// same identity are applied in inbox order.
#[derive(Debug)]
pub enum PortfolioMessage {
    /// Initialize the portfolio for an owner
    Create {
        owner: String,
        reply: mpsc::Sender<Result<PortfolioSnapshot, PortfolioError>>,
    },
    /// Append a holding at the quoted price
    AcquireStock {
        symbol: String,
        observed_at: DateTime<Utc>,
        amount: Quantity,
        price: Price,
        reply: mpsc::Sender<Result<PortfolioSnapshot, PortfolioError>>,
    },
    /// Stop the actor
    Shutdown,
}

/// Portfolio Actor - authoritative single writer for one portfolio identity
pub struct PortfolioActor {
    id: String,
    state: Option<PortfolioState>,
    projection_tx: mpsc::Sender<PortfolioSnapshot>,
}

impl PortfolioActor {
    /// Spawn a new portfolio actor for the given identity.
    ///
    /// Returns the message sender used to communicate with the actor.
    /// Successful mutations are forwarded into `projection_tx` so the
    /// read model catches up eventually.
    pub fn spawn(
        id: String,
        projection_tx: mpsc::Sender<PortfolioSnapshot>,
    ) -> mpsc::Sender<PortfolioMessage> {
        let (tx, rx) = mpsc::channel(100);

        let actor = Self {
            id: id.clone(),
            state: None,
            projection_tx,
        };

        tokio::spawn(async move {
            actor.run(rx).await;
        });

        debug!("PortfolioActor spawned for {}", id);
        tx
    }

    /// Main actor loop
    async fn run(mut self, mut rx: mpsc::Receiver<PortfolioMessage>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                PortfolioMessage::Create { owner, reply } => {
                    debug!("Portfolio {} received Create for owner {}", self.id, owner);

                    let state = PortfolioState::new(self.id.clone(), owner);
                    let snapshot = state.snapshot();
                    self.state = Some(state);
                    self.project(snapshot.clone()).await;

                    if let Err(e) = reply.send(Ok(snapshot)).await {
                        error!("Failed to send Create reply: {:?}", e);
                    }
                }

                PortfolioMessage::AcquireStock {
                    symbol,
                    observed_at,
                    amount,
                    price,
                    reply,
                } => {
                    debug!(
                        "Portfolio {} received AcquireStock for {} x{}",
                        self.id,
                        symbol,
                        amount.value()
                    );

                    let result = match self.state.as_mut() {
                        Some(state) => {
                            state.acquire(symbol, observed_at, amount, price);
                            let snapshot = state.snapshot();
                            self.project(snapshot.clone()).await;
                            Ok(snapshot)
                        }
                        None => {
                            warn!("AcquireStock on uncreated portfolio {}", self.id);
                            Err(PortfolioError::PortfolioNotFound(self.id.clone()))
                        }
                    };

                    if let Err(e) = reply.send(result).await {
                        error!("Failed to send AcquireStock reply: {:?}", e);
                    }
                }

                PortfolioMessage::Shutdown => {
                    info!("Portfolio {} received shutdown signal", self.id);
                    break;
                }
            }
        }

        debug!("PortfolioActor {} stopped", self.id);
    }

    /// Forward a snapshot to the read-model projector. The request has
    /// already succeeded at this point; a closed projector only loses
    /// read-side freshness.
    async fn project(&self, snapshot: PortfolioSnapshot) {
        if self.projection_tx.send(snapshot).await.is_err() {
            warn!("Projection channel closed; read model for {} is stale", self.id);
        }
    }
}
