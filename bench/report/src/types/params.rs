use crate::actor_kind::ActorKind;
use derive_new::new;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, new)]
pub struct BenchmarkParams {
    /// Machine the benchmark was run on
    pub identifier: String,
    pub broker: String,
    pub qos: u8,
    pub message_size: u32,
    pub message_count: u64,
    pub publishers: u32,
    pub subscribers: u32,
}

impl BenchmarkParams {
    pub fn format_actors_info(&self) -> String {
        format!(
            "{} {}/{} {}",
            self.publishers,
            ActorKind::Publisher.plural(),
            self.subscribers,
            ActorKind::Subscriber.plural()
        )
    }

    pub fn total_messages(&self) -> u64 {
        self.message_count * self.publishers as u64
    }
}
