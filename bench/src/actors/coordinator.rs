use super::generator::MessageGenerator;
use super::publisher::{PipelineEvent, PublishPipeline};
use super::subscriber::SubscriberListener;
use super::{
    ClientConfig, ClientOutcome, ClientRole, ClientState, PublisherRole, SubscriberRole,
    PIPELINE_CAPACITY,
};
use crate::analytics::delivery::DeliverySamples;
use crate::analytics::metrics::individual::from_latencies;
use crate::client::{BenchClient, ClientFactory, ConnectOptions};
use human_repr::HumanCount;
use mqtt_bench_report::actor_kind::ActorKind;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info};

const LATENCIES_INITIAL_CAPACITY: u64 = 10_000;

/// Drives one virtual client from connection to its final result.
pub struct ClientRunCoordinator {
    client_factory: Arc<dyn ClientFactory>,
    config: ClientConfig,
    client_id: String,
    kind: ActorKind,
    state: ClientState,
}

impl ClientRunCoordinator {
    pub fn new(client_factory: Arc<dyn ClientFactory>, config: ClientConfig, kind: ActorKind) -> Self {
        let client_id = config.client_id(kind);
        Self {
            client_factory,
            config,
            client_id,
            kind,
            state: ClientState::Idle,
        }
    }

    pub async fn run(self, role: ClientRole) -> ClientOutcome {
        debug_assert_eq!(self.kind, role.kind());
        match role {
            ClientRole::Publisher(publisher) => self.run_publisher(publisher).await,
            ClientRole::Subscriber(subscriber) => self.run_subscriber(subscriber).await,
        }
    }

    fn transition(&mut self, next: ClientState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {next:?}",
            self.state
        );
        debug!(
            "{} {} state {:?} -> {:?}",
            self.kind, self.client_id, self.state, next
        );
        self.state = next;
    }

    /// Connection failures are only logged: the client keeps reconnecting on
    /// its own and every operation attempted meanwhile fails individually.
    async fn connect(&mut self) -> Arc<dyn BenchClient> {
        self.transition(ClientState::Connecting);
        let client = self
            .client_factory
            .create_client(ConnectOptions {
                client_id: self.client_id.clone(),
                credentials: self.config.credentials.clone(),
                quiet: self.config.quiet,
            })
            .await;
        if let Err(error) = client.connect().await {
            error!(
                "CLIENT {} had error connecting to the broker: {error}",
                self.client_id
            );
        }
        client
    }

    async fn run_publisher(mut self, role: PublisherRole) -> ClientOutcome {
        let PublisherRole {
            message_count,
            message_size,
            results,
        } = role;
        let client = self.connect().await;
        self.transition(ClientState::Running);
        if !self.config.quiet {
            info!(
                "CLIENT {} is publishing {} messages of {} bytes to {}",
                self.client_id,
                message_count.human_count_bare(),
                message_size,
                self.config.topic
            );
        }

        let started = Instant::now();
        let (generated_tx, generated_rx) = mpsc::channel(PIPELINE_CAPACITY);
        let (events_tx, mut events_rx) = mpsc::channel(PIPELINE_CAPACITY);
        let generator = MessageGenerator::new(
            self.config.topic.clone(),
            self.config.qos,
            message_size,
            message_count,
        );
        let generator = tokio::spawn(generator.run(generated_tx));
        let pipeline = PublishPipeline::new(client.clone(), self.config.quiet);
        let pipeline = tokio::spawn(pipeline.run(generated_rx, events_tx));

        let mut latencies = Vec::with_capacity(latencies_capacity(message_count));
        let mut successes = 0u64;
        let mut failures = 0u64;
        while let Some(event) = events_rx.recv().await {
            match event {
                PipelineEvent::Published(message) => match message.latency_us() {
                    Some(latency) => {
                        debug!(
                            "CLIENT {} message published: {}: sent: {:?} delivered: {:?} flight time: {latency} us",
                            message.client_id, message.topic, message.sent, message.delivered
                        );
                        successes += 1;
                        latencies.push(latency);
                    }
                    None => failures += 1,
                },
                PipelineEvent::Drained { processed } => {
                    self.transition(ClientState::Draining);
                    debug_assert_eq!(processed, successes + failures);
                    break;
                }
            }
        }

        for (name, handle) in [("generator", generator), ("pipeline", pipeline)] {
            if let Err(error) = handle.await {
                error!("CLIENT {} {name} task failed: {error}", self.client_id);
            }
        }
        if self.state != ClientState::Draining {
            self.transition(ClientState::Draining);
        }
        let accounted = successes + failures;
        if accounted < message_count {
            error!(
                "CLIENT {} lost track of {} messages, counting them as failures",
                self.client_id,
                message_count - accounted
            );
            failures += message_count - accounted;
        }
        let elapsed = started.elapsed();
        client.disconnect().await;

        let summary = from_latencies(
            self.client_id.clone(),
            successes,
            failures,
            &latencies,
            elapsed,
        );
        self.transition(ClientState::Done);
        if results.send(summary).await.is_err() {
            error!(
                "CLIENT {} cannot report results, collector is gone",
                self.client_id
            );
        }
        ClientOutcome::Published
    }

    async fn run_subscriber(mut self, role: SubscriberRole) -> ClientOutcome {
        let SubscriberRole { mut shutdown, ready } = role;
        let client = self.connect().await;
        let inbound = match client.subscribe(&self.config.topic, self.config.qos).await {
            Ok(inbound) => Some(inbound),
            Err(error) => {
                error!(
                    "CLIENT {} cannot subscribe to {}: {error}",
                    self.client_id, self.config.topic
                );
                None
            }
        };
        self.transition(ClientState::Running);
        if let Some(ready) = ready {
            let _ = ready.send(());
        }

        let samples = match inbound {
            Some(inbound) => {
                SubscriberListener::new(self.client_id.clone())
                    .listen(inbound, shutdown)
                    .await
            }
            None => {
                let stop = *shutdown.borrow();
                if !stop {
                    let _ = shutdown.changed().await;
                }
                DeliverySamples::default()
            }
        };

        client.disconnect().await;
        if !self.config.quiet {
            info!(
                "CLIENT {} is done subscribing, received {} messages",
                self.client_id,
                samples.total()
            );
        }
        self.transition(ClientState::Done);
        ClientOutcome::Subscribed(samples)
    }
}

/// The latency buffer grows with the run instead of reserving the whole count up front.
fn latencies_capacity(message_count: u64) -> usize {
    message_count.min(LATENCIES_INITIAL_CAPACITY) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::in_memory::InMemoryBroker;
    use crate::client::Credentials;
    use crate::message::Message;
    use mqtt_bench_report::run_summary::RunSummary;
    use rumqttc::QoS;
    use tokio::sync::{oneshot, watch};

    const TOPIC: &str = "channels/1/messages/test";

    fn config(index: u32, username: &str) -> ClientConfig {
        ClientConfig {
            index,
            topic: TOPIC.to_owned(),
            qos: QoS::AtLeastOnce,
            credentials: Some(Credentials {
                username: username.to_owned(),
                password: "key".to_owned(),
            }),
            quiet: true,
        }
    }

    async fn publish(broker: &InMemoryBroker, username: &str, count: u64) -> RunSummary {
        let (results_tx, mut results_rx) = mpsc::channel(1);
        let coordinator =
            ClientRunCoordinator::new(Arc::new(broker.clone()), config(0, username), ActorKind::Publisher);
        let outcome = coordinator
            .run(ClientRole::Publisher(PublisherRole {
                message_count: count,
                message_size: 32,
                results: results_tx,
            }))
            .await;
        assert!(matches!(outcome, ClientOutcome::Published));
        results_rx.recv().await.unwrap()
    }

    #[tokio::test]
    async fn should_account_for_every_generated_message() {
        let broker = InMemoryBroker::default();

        let summary = publish(&broker, "good", 150).await;

        assert!(summary.id.starts_with("pub-"));
        assert_eq!(summary.successes, 150);
        assert_eq!(summary.failures, 0);
        assert_eq!(summary.total_messages(), 150);
        assert!(summary.msg_time_min <= summary.msg_time_mean);
        assert!(summary.msg_time_mean <= summary.msg_time_max);
        assert_eq!(broker.published(), 150);
    }

    #[tokio::test]
    async fn should_count_failures_when_connect_failed() {
        let broker = InMemoryBroker::rejecting(&["bad"]);

        let summary = publish(&broker, "bad", 4).await;

        assert_eq!(summary.successes, 0);
        assert_eq!(summary.failures, 4);
        assert_eq!(summary.msgs_per_sec, 0.0);
        assert!(summary.msg_time_mean.is_nan());
    }

    #[test]
    fn should_cap_initial_latency_buffer() {
        assert_eq!(latencies_capacity(0), 0);
        assert_eq!(latencies_capacity(150), 150);
        assert_eq!(latencies_capacity(u64::MAX), 10_000);
    }

    #[tokio::test]
    async fn should_report_empty_run_for_zero_messages() {
        let broker = InMemoryBroker::default();

        let summary = publish(&broker, "good", 0).await;

        assert_eq!(summary.total_messages(), 0);
    }

    #[tokio::test]
    async fn should_collect_deliveries_until_shutdown() {
        let broker = InMemoryBroker::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = oneshot::channel();
        let coordinator =
            ClientRunCoordinator::new(Arc::new(broker.clone()), config(1, "good"), ActorKind::Subscriber);
        let subscriber = tokio::spawn(coordinator.run(ClientRole::Subscriber(SubscriberRole {
            shutdown: shutdown_rx,
            ready: Some(ready_tx),
        })));
        ready_rx.await.unwrap();

        let summary = publish(&broker, "good", 3).await;
        broker.inject(TOPIC, b"not a payload");
        shutdown_tx.send(true).unwrap();

        let ClientOutcome::Subscribed(samples) = subscriber.await.unwrap() else {
            panic!("subscriber should return samples");
        };
        assert_eq!(samples.get(&summary.id).len(), 3);
        assert_eq!(samples.total(), 3);
    }

    #[tokio::test]
    async fn should_finish_subscriber_without_samples_when_subscribe_failed() {
        let broker = InMemoryBroker::rejecting(&["bad"]);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let coordinator =
            ClientRunCoordinator::new(Arc::new(broker.clone()), config(2, "bad"), ActorKind::Subscriber);
        let subscriber = tokio::spawn(coordinator.run(ClientRole::Subscriber(SubscriberRole {
            shutdown: shutdown_rx,
            ready: None,
        })));

        let mut message = Message::new(TOPIC.to_owned(), QoS::AtMostOnce, 1);
        broker.inject(TOPIC, &message.encode("pub-x", chrono::Utc::now()).unwrap());
        shutdown_tx.send(true).unwrap();

        let ClientOutcome::Subscribed(samples) = subscriber.await.unwrap() else {
            panic!("subscriber should return samples");
        };
        assert!(samples.is_empty());
    }
}
