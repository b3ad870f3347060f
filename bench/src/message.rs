use chrono::{DateTime, Utc};
use rumqttc::QoS;
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;

/// Envelope written on the wire, echoed back to subscribers so they can
/// correlate a delivery with its publisher and send time.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Sent")]
    pub sent: DateTime<Utc>,
    /// Raw bytes travel as a base64 string.
    #[serde(rename = "Payload")]
    #[serde_as(as = "Base64")]
    pub payload: Vec<u8>,
}

impl MessagePayload {
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub client_id: String,
    pub topic: String,
    pub qos: QoS,
    pub payload: Vec<u8>,
    pub sent: Option<DateTime<Utc>>,
    pub delivered: Option<DateTime<Utc>>,
    pub failed: bool,
}

impl Message {
    pub fn new(topic: String, qos: QoS, payload_size: usize) -> Self {
        Self {
            client_id: String::new(),
            topic,
            qos,
            payload: vec![0; payload_size],
            sent: None,
            delivered: None,
            failed: false,
        }
    }

    /// Serializes the payload stamped with the sender identity and send time.
    pub fn encode(
        &mut self,
        client_id: &str,
        sent: DateTime<Utc>,
    ) -> Result<Vec<u8>, serde_json::Error> {
        self.client_id = client_id.to_owned();
        self.sent = Some(sent);
        let envelope = MessagePayload {
            id: client_id.to_owned(),
            sent,
            payload: std::mem::take(&mut self.payload),
        };
        let encoded = serde_json::to_vec(&envelope);
        self.payload = envelope.payload;
        encoded
    }

    /// Publish round trip in microseconds, `None` for failed or unsent messages.
    pub fn latency_us(&self) -> Option<f64> {
        if self.failed {
            return None;
        }
        let (sent, delivered) = (self.sent?, self.delivered?);
        (delivered - sent).num_microseconds().map(|us| us as f64)
    }
}
