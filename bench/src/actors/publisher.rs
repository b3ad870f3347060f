use super::generator::Generated;
use crate::client::BenchClient;
use crate::message::Message;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

const PROGRESS_INTERVAL: u64 = 100;

#[derive(Debug)]
pub enum PipelineEvent {
    Published(Message),
    /// Sent once, after every generated message has been published.
    Drained { processed: u64 },
}

pub struct PublishPipeline {
    client: Arc<dyn BenchClient>,
    quiet: bool,
}

impl PublishPipeline {
    pub fn new(client: Arc<dyn BenchClient>, quiet: bool) -> Self {
        Self { client, quiet }
    }

    pub async fn run(
        self,
        mut generated: mpsc::Receiver<Generated>,
        events: mpsc::Sender<PipelineEvent>,
    ) {
        let client_id = self.client.client_id().to_owned();
        let mut processed = 0u64;
        while let Some(item) = generated.recv().await {
            match item {
                Generated::Message(message) => {
                    let message = self.publish(message).await;
                    processed += 1;
                    if events.send(PipelineEvent::Published(message)).await.is_err() {
                        return;
                    }
                    if !self.quiet && processed % PROGRESS_INTERVAL == 0 {
                        info!(
                            "CLIENT {client_id} published {processed} messages and keeps publishing..."
                        );
                    }
                }
                Generated::Done => {
                    let _ = events.send(PipelineEvent::Drained { processed }).await;
                    if !self.quiet {
                        info!("CLIENT {client_id} is done publishing");
                    }
                    return;
                }
            }
        }
    }

    async fn publish(&self, mut message: Message) -> Message {
        let client_id = self.client.client_id();
        let payload = match message.encode(client_id, Utc::now()) {
            Ok(payload) => payload,
            Err(error) => {
                error!("CLIENT {client_id} cannot encode message: {error}");
                message.failed = true;
                return message;
            }
        };

        match self
            .client
            .publish(&message.topic, message.qos, payload)
            .await
        {
            Ok(()) => message.delivered = Some(Utc::now()),
            Err(error) => {
                error!("CLIENT {client_id} Error sending message: {error}");
                message.failed = true;
            }
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::generator::MessageGenerator;
    use crate::client::in_memory::InMemoryBroker;
    use crate::client::{ClientFactory, ConnectOptions, Credentials};
    use rumqttc::QoS;

    async fn client(broker: &InMemoryBroker, username: &str) -> Arc<dyn BenchClient> {
        let client = broker
            .create_client(ConnectOptions {
                client_id: format!("pub-{username}"),
                credentials: Some(Credentials {
                    username: username.to_owned(),
                    password: "secret".to_owned(),
                }),
                quiet: true,
            })
            .await;
        let _ = client.connect().await;
        client
    }

    async fn run_pipeline(client: Arc<dyn BenchClient>, count: u64) -> Vec<PipelineEvent> {
        let (generated_tx, generated_rx) = mpsc::channel(4);
        let (events_tx, mut events_rx) = mpsc::channel(4);
        let generator = MessageGenerator::new("topic".to_owned(), QoS::AtLeastOnce, 8, count);
        tokio::spawn(generator.run(generated_tx));
        tokio::spawn(PublishPipeline::new(client, true).run(generated_rx, events_tx));

        let mut events = Vec::new();
        while let Some(event) = events_rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn should_publish_every_message_and_drain_once() {
        let broker = InMemoryBroker::default();
        let client = client(&broker, "good").await;

        let events = run_pipeline(client, 5).await;

        assert_eq!(events.len(), 6);
        for event in &events[..5] {
            let PipelineEvent::Published(message) = event else {
                panic!("expected published message, got {event:?}");
            };
            assert!(!message.failed);
            assert_eq!(message.client_id, "pub-good");
            assert!(message.delivered.unwrap() >= message.sent.unwrap());
        }
        assert!(matches!(events[5], PipelineEvent::Drained { processed: 5 }));
        assert_eq!(broker.published(), 5);
    }

    #[tokio::test]
    async fn should_preserve_send_order() {
        let broker = InMemoryBroker::default();
        let client = client(&broker, "good").await;

        let events = run_pipeline(client, 20).await;

        let sent: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                PipelineEvent::Published(message) => message.sent,
                PipelineEvent::Drained { .. } => None,
            })
            .collect();
        assert_eq!(sent.len(), 20);
        assert!(sent.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn should_mark_messages_failed_when_client_is_not_connected() {
        let broker = InMemoryBroker::rejecting(&["bad"]);
        let client = client(&broker, "bad").await;

        let events = run_pipeline(client, 3).await;

        let failed = events
            .iter()
            .filter(|event| {
                matches!(event, PipelineEvent::Published(m) if m.failed && m.delivered.is_none())
            })
            .count();
        assert_eq!(failed, 3);
        assert!(matches!(events.last(), Some(PipelineEvent::Drained { processed: 3 })));
        assert_eq!(broker.published(), 0);
    }
}
