use crate::utils::{nan_if_null, round_float};
use serde::{Deserialize, Serialize};

/// Whole-run aggregate across all publishing clients.
///
/// `*_mean_avg` and `*_mean_std` are computed over the per-client mean latencies
/// (a mean of means), not over the pooled samples of every client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TotalsSummary {
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub ratio: f64,
    pub successes: u64,
    pub failures: u64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub total_run_time: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub avg_run_time: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_min: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_max: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_min: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_max: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_mean_avg: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_time_mean_std: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_mean_avg: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub msg_del_time_mean_std: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub total_msgs_per_sec: f64,
    #[serde(serialize_with = "round_float", deserialize_with = "nan_if_null")]
    pub avg_msgs_per_sec: f64,
}

impl TotalsSummary {
    pub fn total_messages(&self) -> u64 {
        self.successes + self.failures
    }
}
