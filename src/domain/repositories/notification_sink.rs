//! Notification Sink Trait
//!
//! Boundary to the downstream party interested in completed acquisitions
//! (e.g. an accounting system). The publisher delivers notices through this
//! trait; implementations can be swapped and mocked freely.

use crate::domain::entities::portfolio::AcquisitionNotice;
use async_trait::async_trait;
use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Debug, Error, Clone)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Notification endpoint rejected notice: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    /// Delivers one acquisition notice. Failures are reported to the
    /// publisher worker only; they never reach the request path.
    async fn deliver(&self, notice: &AcquisitionNotice) -> NotifyResult<()>;
}
