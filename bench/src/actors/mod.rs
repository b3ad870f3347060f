pub mod coordinator;
pub mod generator;
pub mod publisher;
pub mod subscriber;

use crate::analytics::delivery::DeliverySamples;
use crate::client::Credentials;
use chrono::{SecondsFormat, Utc};
use mqtt_bench_report::actor_kind::ActorKind;
use mqtt_bench_report::run_summary::RunSummary;
use rumqttc::QoS;
use tokio::sync::{mpsc, oneshot, watch};

/// Capacity of the queues between generator, pipeline and coordinator.
pub const PIPELINE_CAPACITY: usize = 100;

/// Settings shared by both client roles.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub index: u32,
    pub topic: String,
    pub qos: QoS,
    pub credentials: Option<Credentials>,
    pub quiet: bool,
}

impl ClientConfig {
    /// Broker-unique identity, e.g. `pub-2025-01-01T00:00:00.000000000Z-3`.
    pub fn client_id(&self, kind: ActorKind) -> String {
        format!(
            "{}-{}-{}",
            kind.client_id_prefix(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.index
        )
    }
}

pub struct PublisherRole {
    pub message_count: u64,
    pub message_size: usize,
    pub results: mpsc::Sender<RunSummary>,
}

pub struct SubscriberRole {
    pub shutdown: watch::Receiver<bool>,
    /// Fired once the subscription is in place (or failed), before listening starts.
    pub ready: Option<oneshot::Sender<()>>,
}

pub enum ClientRole {
    Publisher(PublisherRole),
    Subscriber(SubscriberRole),
}

impl ClientRole {
    pub fn kind(&self) -> ActorKind {
        match self {
            ClientRole::Publisher(_) => ActorKind::Publisher,
            ClientRole::Subscriber(_) => ActorKind::Subscriber,
        }
    }
}

#[derive(Debug)]
pub enum ClientOutcome {
    Published,
    Subscribed(DeliverySamples),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    Connecting,
    Running,
    Draining,
    Done,
}

impl ClientState {
    pub fn can_transition_to(self, next: ClientState) -> bool {
        use ClientState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Running)
                | (Running, Draining)
                | (Running, Done)
                | (Draining, Done)
        )
    }
}
