use crate::message::Message;
use rumqttc::QoS;
use tokio::sync::mpsc;

/// Item produced by the generator; `Done` always follows the last message.
#[derive(Debug)]
pub enum Generated {
    Message(Message),
    Done,
}

#[derive(Debug, Clone)]
pub struct MessageGenerator {
    topic: String,
    qos: QoS,
    message_size: usize,
    message_count: u64,
}

impl MessageGenerator {
    pub fn new(topic: String, qos: QoS, message_size: usize, message_count: u64) -> Self {
        Self {
            topic,
            qos,
            message_size,
            message_count,
        }
    }

    /// Pushes every generated item into the pipeline queue, waiting when it is full.
    pub async fn run(self, sender: mpsc::Sender<Generated>) {
        for generated in self {
            if sender.send(generated).await.is_err() {
                break;
            }
        }
    }
}

impl IntoIterator for MessageGenerator {
    type Item = Generated;
    type IntoIter = Box<dyn Iterator<Item = Generated> + Send>;

    fn into_iter(self) -> Self::IntoIter {
        let MessageGenerator {
            topic,
            qos,
            message_size,
            message_count,
        } = self;
        let messages = (0..message_count)
            .map(move |_| Generated::Message(Message::new(topic.clone(), qos, message_size)));
        Box::new(messages.chain(std::iter::once(Generated::Done)))
    }
}
