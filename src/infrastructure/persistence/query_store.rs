//! Query Model State Store
//!
//! Materialized read model for portfolio snapshots. A background projector
//! task drains the projection channel fed by the portfolio actors, so read
//! latency never serializes behind the write path. The store is eventually
//! consistent with the live entities.

use crate::domain::entities::portfolio::PortfolioSnapshot;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::debug;

pub struct QueryStore {
    snapshots: RwLock<HashMap<String, PortfolioSnapshot>>,
}

impl QueryStore {
    fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Latest known projection for the identity, or `None` when the
    /// portfolio has not (yet) reached the read model.
    pub async fn portfolio_of(&self, id: &str) -> Option<PortfolioSnapshot> {
        let snapshots = self.snapshots.read().await;
        snapshots.get(id).cloned()
    }

    async fn apply(&self, snapshot: PortfolioSnapshot) {
        debug!(
            "Projecting portfolio {} ({} holdings)",
            snapshot.id,
            snapshot.holdings.len()
        );
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.id.clone(), snapshot);
    }

    /// Build a store together with its projection sender and spawn the
    /// projector task. The projector stops once every sender is dropped.
    pub fn spawn(capacity: usize) -> (Arc<QueryStore>, mpsc::Sender<PortfolioSnapshot>) {
        let store = Arc::new(Self::new());
        let (tx, mut rx) = mpsc::channel::<PortfolioSnapshot>(capacity);

        let projector = store.clone();
        tokio::spawn(async move {
            debug!("Query model projector started");
            while let Some(snapshot) = rx.recv().await {
                projector.apply(snapshot).await;
            }
            debug!("Query model projector stopped");
        });

        (store, tx)
    }
}

/// First-writer-wins construction of the query store.
///
/// `initialize` builds the store and projector exactly once and returns
/// the same pair to every later caller; `reset` tears the slot down so
/// tests can start from an empty read model. Held by the composition root
/// rather than living as process-global state.
pub struct QueryStoreProvider {
    capacity: usize,
    slot: Mutex<Option<(Arc<QueryStore>, mpsc::Sender<PortfolioSnapshot>)>>,
}

impl QueryStoreProvider {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slot: Mutex::new(None),
        }
    }

    pub async fn initialize(&self) -> (Arc<QueryStore>, mpsc::Sender<PortfolioSnapshot>) {
        let mut slot = self.slot.lock().await;
        if let Some(existing) = slot.as_ref() {
            return existing.clone();
        }

        let built = QueryStore::spawn(self.capacity);
        *slot = Some(built.clone());
        built
    }

    /// Drops the current store so the next `initialize` builds a fresh,
    /// empty one. The old projector stops when its last sender is dropped.
    pub async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
    }
}
