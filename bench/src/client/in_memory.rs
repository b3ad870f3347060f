use super::{BenchClient, ClientFactory, ConnectOptions, InboundMessage, InboundMessages};
use crate::error::BenchError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rumqttc::QoS;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct BrokerState {
    subscriptions: Vec<(String, mpsc::UnboundedSender<InboundMessage>)>,
    published: usize,
}

/// Broker double delivering publishes synchronously to every subscription on the same topic.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    rejected_usernames: Arc<HashSet<String>>,
}

impl InMemoryBroker {
    pub fn rejecting(usernames: &[&str]) -> Self {
        Self {
            rejected_usernames: Arc::new(usernames.iter().map(|u| u.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn published(&self) -> usize {
        self.state.lock().unwrap().published
    }

    /// Pushes a raw message to subscribers as if some foreign client sent it.
    pub fn inject(&self, topic: &str, payload: &[u8]) {
        self.deliver(topic, payload);
    }

    fn deliver(&self, topic: &str, payload: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.published += 1;
        for (subscribed, sender) in &state.subscriptions {
            if subscribed == topic {
                let _ = sender.send(InboundMessage {
                    topic: topic.to_owned(),
                    payload: Bytes::copy_from_slice(payload),
                    received_at: Utc::now(),
                });
            }
        }
    }
}

#[async_trait]
impl ClientFactory for InMemoryBroker {
    async fn create_client(&self, options: ConnectOptions) -> Arc<dyn BenchClient> {
        Arc::new(InMemoryClient {
            broker: self.clone(),
            options,
            connected: AtomicBool::new(false),
        })
    }
}

pub struct InMemoryClient {
    broker: InMemoryBroker,
    options: ConnectOptions,
    connected: AtomicBool,
}

#[async_trait]
impl BenchClient for InMemoryClient {
    fn client_id(&self) -> &str {
        &self.options.client_id
    }

    async fn connect(&self) -> Result<(), BenchError> {
        let rejected = self
            .options
            .credentials
            .as_ref()
            .is_some_and(|c| self.broker.rejected_usernames.contains(&c.username));
        if rejected {
            return Err(BenchError::ConnectError("not authorized".to_owned()));
        }
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    async fn publish(&self, topic: &str, _qos: QoS, payload: Vec<u8>) -> Result<(), BenchError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(BenchError::NotConnected);
        }
        self.broker.deliver(topic, &payload);
        Ok(())
    }

    async fn subscribe(&self, topic: &str, _qos: QoS) -> Result<InboundMessages, BenchError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(BenchError::NotConnected);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.broker
            .state
            .lock()
            .unwrap()
            .subscriptions
            .push((topic.to_owned(), tx));
        Ok(rx)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }
}
