//! Acquisition Publisher
//!
//! Fire-and-forget notification of completed purchases. Notices go into a
//! bounded queue drained by a background worker; the request path never
//! waits for delivery and never sees a delivery failure.

use crate::domain::entities::portfolio::AcquisitionNotice;
use crate::domain::repositories::notification_sink::{
    NotificationSink, NotifyError, NotifyResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AcquisitionPublisher {
    tx: mpsc::Sender<AcquisitionNotice>,
}

impl AcquisitionPublisher {
    /// Spawn the delivery worker. `capacity` bounds the in-flight queue;
    /// once it is full, further notices are dropped (and logged), not
    /// queued unboundedly.
    pub fn spawn(sink: Arc<dyn NotificationSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AcquisitionNotice>(capacity);

        tokio::spawn(async move {
            info!("Acquisition publisher started (sink: {})", sink.name());

            while let Some(notice) = rx.recv().await {
                match sink.deliver(&notice).await {
                    Ok(()) => {
                        debug!(
                            "Delivered acquisition notice: owner={} value={:.2}",
                            notice.owner, notice.value
                        );
                    }
                    Err(e) => {
                        // The originating request already completed; delivery
                        // is best-effort with no retry at this layer.
                        warn!(
                            "Failed to deliver acquisition notice for {}: {}",
                            notice.owner, e
                        );
                    }
                }
            }

            info!("Acquisition publisher stopped");
        });

        Self { tx }
    }

    /// Enqueue a notice. Never blocks and never fails the caller; a full
    /// or closed queue drops the notice with a warning.
    pub fn publish(&self, owner: &str, value: f64) {
        let notice = AcquisitionNotice {
            owner: owner.to_string(),
            value,
        };

        if let Err(e) = self.tx.try_send(notice) {
            warn!("Dropping acquisition notice: {}", e);
        }
    }
}

/// Delivers notices as JSON POSTs to the accounting endpoint.
pub struct HttpNotificationSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotificationSink {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, notice: &AcquisitionNotice) -> NotifyResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notice)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| NotifyError::Rejected(e.to_string()))?;

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::RecordingSink;
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_publish_delivers_notice() {
        let sink = RecordingSink::new();
        let publisher = AcquisitionPublisher::spawn(sink.clone(), 16);

        publisher.publish("alice", 50.0);

        for _ in 0..100 {
            if !sink.delivered.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].owner, "alice");
        assert_eq!(delivered[0].value, 50.0);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_worker() {
        let failing = RecordingSink::failing();
        let publisher = AcquisitionPublisher::spawn(failing.clone(), 16);

        // Both publishes succeed from the caller's point of view
        publisher.publish("alice", 50.0);
        publisher.publish("bob", 25.0);

        // Worker stays alive and keeps draining
        tokio::time::sleep(Duration::from_millis(50)).await;
        publisher.publish("carol", 10.0);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(failing.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_on_full_queue_is_silent() {
        let sink = RecordingSink::new();
        let publisher = AcquisitionPublisher::spawn(sink, 1);

        // Flood well past capacity; none of these may error or block
        for i in 0..50 {
            publisher.publish("alice", i as f64);
        }
    }
}
