use crate::utils::{nan_if_null, round_float};
use serde::{Deserialize, Serialize};

/// Results of a single publishing client.
///
/// Latencies are expressed in microseconds, run time in seconds. The `msg_del_*`
/// fields describe latency observed by subscribers for messages carrying this
/// client's identity and stay `NaN` when no subscriber saw any of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub id: String,
    pub successes: u64,
    pub failures: u64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub run_time: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_min: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_max: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_mean: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_std: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_min: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_max: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_mean: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_std: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msgs_per_sec: f64,
}

impl RunSummary {
    pub fn total_messages(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn ratio(&self) -> f64 {
        self.successes as f64 / self.total_messages() as f64
    }
}
