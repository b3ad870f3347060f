use super::defaults::DEFAULT_CHANNEL_ID;
use crate::client::Credentials;
use crate::error::BenchError;
use serde::Deserialize;
use tracing::{error, info};

/// One provisioned thing and the channel it is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Connection {
    #[serde(rename = "ChannelID")]
    pub channel_id: String,
    #[serde(rename = "ThingID")]
    pub thing_id: String,
    #[serde(rename = "ThingKey")]
    pub thing_key: String,
}

impl Connection {
    pub fn topic(&self) -> String {
        channel_topic(&self.channel_id)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.thing_id.clone(),
            password: self.thing_key.clone(),
        }
    }
}

pub fn channel_topic(channel_id: &str) -> String {
    format!("channels/{channel_id}/messages/test")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections {
    entries: Vec<Connection>,
}

impl Connections {
    #[cfg(test)]
    pub fn new(entries: Vec<Connection>) -> Self {
        Self { entries }
    }

    pub fn load(path: &str) -> Result<Self, BenchError> {
        let cannot_read = |reason: String| BenchError::CannotReadConnections {
            path: path.to_owned(),
            reason,
        };
        let json = std::fs::read_to_string(path).map_err(|e| cannot_read(e.to_string()))?;
        let entries: Vec<Connection> =
            serde_json::from_str(&json).map_err(|e| cannot_read(e.to_string()))?;
        Ok(Self { entries })
    }

    /// Falls back to anonymous clients on the default channel when the file
    /// cannot be used.
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(connections) if connections.is_empty() => {
                error!("No connections found in {path}, clients will connect anonymously");
                connections
            }
            Ok(connections) => {
                info!("Loaded {} connections from {path}", connections.len());
                connections
            }
            Err(error) => {
                error!("{error}, clients will connect anonymously");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries are shared round-robin: client `i` uses entry `i % n`.
    pub fn for_client(&self, index: u32) -> Option<&Connection> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.get(index as usize % self.entries.len())
    }

    pub fn topic_for(&self, index: u32) -> String {
        self.for_client(index)
            .map(Connection::topic)
            .unwrap_or_else(|| channel_topic(DEFAULT_CHANNEL_ID))
    }

    pub fn credentials_for(&self, index: u32) -> Option<Credentials> {
        self.for_client(index).map(Connection::credentials)
    }
}
