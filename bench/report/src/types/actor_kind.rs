use derive_more::derive::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Display)]
pub enum ActorKind {
    #[display("Publisher")]
    #[serde(rename = "publisher")]
    Publisher,
    #[display("Subscriber")]
    #[serde(rename = "subscriber")]
    Subscriber,
}

impl ActorKind {
    pub fn plural(&self) -> &str {
        match self {
            ActorKind::Publisher => "Publishers",
            ActorKind::Subscriber => "Subscribers",
        }
    }

    /// Prefix used when building the MQTT client identifier.
    pub fn client_id_prefix(&self) -> &str {
        match self {
            ActorKind::Publisher => "pub",
            ActorKind::Subscriber => "sub",
        }
    }
}
