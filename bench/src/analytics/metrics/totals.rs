use crate::analytics::delivery::DeliverySamples;
use crate::analytics::statistics::{self, LatencyStatistics};
use mqtt_bench_report::run_summary::RunSummary;
use mqtt_bench_report::totals_summary::TotalsSummary;
use std::time::Duration;

/// Copies the runs, filling in the delivery latency observed by subscribers for each publisher.
pub fn with_delivery_statistics(
    runs: &[RunSummary],
    samples: &DeliverySamples,
) -> Vec<RunSummary> {
    runs.iter()
        .map(|run| {
            let delivery = LatencyStatistics::from_samples(samples.get(&run.id));
            RunSummary {
                msg_del_time_min: delivery.min,
                msg_del_time_max: delivery.max,
                msg_del_time_mean: delivery.mean,
                msg_del_time_std: delivery.std_dev,
                ..run.clone()
            }
        })
        .collect()
}

/// Aggregates every publisher run into the whole-benchmark totals.
///
/// Minimum and maximum latencies are taken over the per-client minimums and
/// maximums. The `*_mean_avg` / `*_mean_std` values are the mean and sample
/// standard deviation of the per-client means, which is not the same as the
/// pooled mean of all samples when clients delivered different message
/// counts. Clients without a single latency sample have no mean and are left
/// out of those two values.
///
/// Returns `None` when no publisher reported.
pub fn calculate_totals(
    runs: &[RunSummary],
    samples: &DeliverySamples,
    total_time: Duration,
) -> Option<TotalsSummary> {
    if runs.is_empty() {
        return None;
    }

    let successes: u64 = runs.iter().map(|run| run.successes).sum();
    let failures: u64 = runs.iter().map(|run| run.failures).sum();
    let ratio = successes as f64 / (successes + failures) as f64;

    let delivery: Vec<LatencyStatistics> = runs
        .iter()
        .map(|run| LatencyStatistics::from_samples(samples.get(&run.id)))
        .collect();

    let run_times: Vec<f64> = runs.iter().map(|run| run.run_time).collect();
    let msgs_per_sec: Vec<f64> = runs.iter().map(|run| run.msgs_per_sec).collect();
    let publish_mins: Vec<f64> = runs.iter().map(|run| run.msg_time_min).collect();
    let publish_maxes: Vec<f64> = runs.iter().map(|run| run.msg_time_max).collect();
    let publish_means = finite(runs.iter().map(|run| run.msg_time_mean));
    let delivery_mins: Vec<f64> = delivery.iter().map(|stats| stats.min).collect();
    let delivery_maxes: Vec<f64> = delivery.iter().map(|stats| stats.max).collect();
    let delivery_means = finite(delivery.iter().map(|stats| stats.mean));

    Some(TotalsSummary {
        ratio,
        successes,
        failures,
        total_run_time: total_time.as_secs_f64(),
        avg_run_time: statistics::mean(&run_times),
        msg_time_min: statistics::min(&publish_mins),
        msg_time_max: statistics::max(&publish_maxes),
        msg_del_time_min: statistics::min(&delivery_mins),
        msg_del_time_max: statistics::max(&delivery_maxes),
        msg_time_mean_avg: statistics::mean(&publish_means),
        msg_time_mean_std: statistics::sample_std_dev(&publish_means),
        msg_del_time_mean_avg: statistics::mean(&delivery_means),
        msg_del_time_mean_std: statistics::sample_std_dev(&delivery_means),
        total_msgs_per_sec: msgs_per_sec.iter().sum(),
        avg_msgs_per_sec: statistics::mean(&msgs_per_sec),
    })
}

fn finite(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values.filter(|value| value.is_finite()).collect()
}
