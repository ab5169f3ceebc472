use crate::domain::value_objects::{price::Price, quantity::Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single acquired position. Owned exclusively by its portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: Quantity,
    pub price: Price,
    pub acquired_at: DateTime<Utc>,
}

/// Authoritative portfolio state. Mutated only inside the portfolio actor;
/// holdings are append-only (no removal is modeled).
#[derive(Debug, Clone)]
pub struct PortfolioState {
    id: String,
    owner: String,
    holdings: Vec<Holding>,
}

impl PortfolioState {
    pub fn new(id: String, owner: String) -> Self {
        Self {
            id,
            owner,
            holdings: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Appends a holding at the quoted price. The caller has already
    /// verified that a quote exists for the symbol.
    pub fn acquire(
        &mut self,
        symbol: String,
        acquired_at: DateTime<Utc>,
        quantity: Quantity,
        price: Price,
    ) {
        self.holdings.push(Holding {
            symbol,
            quantity,
            price,
            acquired_at,
        });
    }

    /// Point-in-time immutable copy for the read model. Holds no reference
    /// back into the live state.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            id: self.id.clone(),
            owner: self.owner.clone(),
            holdings: self.holdings.clone(),
        }
    }
}

/// Read-model projection of a portfolio. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub id: String,
    pub owner: String,
    pub holdings: Vec<Holding>,
}

/// Notification handed to the acquisition publisher after a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionNotice {
    pub owner: String,
    pub value: f64,
}
