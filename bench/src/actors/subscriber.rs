use crate::analytics::delivery::DeliverySamples;
use crate::client::{InboundMessage, InboundMessages};
use crate::error::BenchError;
use crate::message::MessagePayload;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Records the delivery latency of every message seen on a subscription.
pub struct SubscriberListener {
    client_id: String,
    samples: DeliverySamples,
}

impl SubscriberListener {
    pub fn new(client_id: String) -> Self {
        Self {
            client_id,
            samples: DeliverySamples::default(),
        }
    }

    /// Listens until the shutdown flag is raised, then drains what is already
    /// queued and hands the collected samples back.
    pub async fn listen(
        mut self,
        mut inbound: InboundMessages,
        mut shutdown: watch::Receiver<bool>,
    ) -> DeliverySamples {
        let stop = *shutdown.borrow();
        if !stop {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    message = inbound.recv() => match message {
                        Some(message) => self.on_message(message),
                        None => {
                            let _ = shutdown.changed().await;
                            break;
                        }
                    },
                }
            }
        }
        while let Ok(message) = inbound.try_recv() {
            self.on_message(message);
        }
        self.samples
    }

    fn on_message(&mut self, message: InboundMessage) {
        if let Err(error) = self.record(&message) {
            warn!(
                "CLIENT {} failed to decode message on topic {}: {error}",
                self.client_id, message.topic
            );
        }
    }

    pub fn record(&mut self, message: &InboundMessage) -> Result<(), BenchError> {
        let payload = MessagePayload::decode(&message.payload)?;
        let latency = message.received_at - payload.sent;
        let latency_us = latency.num_microseconds().unwrap_or(i64::MAX) as f64;
        debug!(
            "CLIENT {} received message on topic: {} - {}",
            self.client_id, message.topic, payload.id
        );
        self.samples.record(&payload.id, latency_us);
        Ok(())
    }
}
