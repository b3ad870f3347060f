pub mod mqtt;

#[cfg(test)]
pub mod fake_broker;
#[cfg(test)]
pub mod in_memory;

use crate::error::BenchError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rumqttc::QoS;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub client_id: String,
    pub credentials: Option<Credentials>,
    pub quiet: bool,
}

/// A message received on a subscription, stamped when it left the network layer.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
    pub received_at: DateTime<Utc>,
}

pub type InboundMessages = UnboundedReceiver<InboundMessage>;

#[async_trait]
pub trait BenchClient: Send + Sync {
    fn client_id(&self) -> &str;

    /// Completes the broker handshake. The client keeps reconnecting in the
    /// background after a failed attempt, so the error is informational.
    async fn connect(&self) -> Result<(), BenchError>;

    /// Returns once the broker acknowledged the message for the given QoS.
    async fn publish(&self, topic: &str, qos: QoS, payload: Vec<u8>) -> Result<(), BenchError>;

    async fn subscribe(&self, topic: &str, qos: QoS) -> Result<InboundMessages, BenchError>;

    async fn disconnect(&self);
}

#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create_client(&self, options: ConnectOptions) -> Arc<dyn BenchClient>;
}

pub fn qos_from_level(level: u8) -> Result<QoS, BenchError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        _ => Err(BenchError::InvalidConfiguration(format!(
            "QoS must be 0, 1 or 2, got {level}"
        ))),
    }
}

pub fn qos_level(qos: QoS) -> u8 {
    match qos {
        QoS::AtMostOnce => 0,
        QoS::AtLeastOnce => 1,
        QoS::ExactlyOnce => 2,
    }
}
