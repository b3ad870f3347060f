use std::collections::HashMap;

/// Delivery latencies (microseconds) observed by subscribers, keyed by the
/// identity of the publisher that sent the message.
///
/// Every subscriber fills its own instance; the instances are merged once all
/// subscribers have stopped, so no two tasks ever touch the same map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliverySamples {
    samples: HashMap<String, Vec<f64>>,
}

impl DeliverySamples {
    pub fn record(&mut self, publisher_id: &str, latency_us: f64) {
        self.samples
            .entry(publisher_id.to_owned())
            .or_default()
            .push(latency_us);
    }

    pub fn merge(&mut self, other: DeliverySamples) {
        for (publisher_id, mut latencies) in other.samples {
            self.samples
                .entry(publisher_id)
                .or_default()
                .append(&mut latencies);
        }
    }

    pub fn get(&self, publisher_id: &str) -> &[f64] {
        self.samples
            .get(publisher_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn publishers(&self) -> usize {
        self.samples.len()
    }

    pub fn total(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
