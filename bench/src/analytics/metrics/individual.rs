use crate::analytics::statistics::LatencyStatistics;
use mqtt_bench_report::run_summary::RunSummary;
use std::time::Duration;

/// Builds the summary of one publisher from its successful publish latencies.
///
/// Delivery statistics are left undefined here; they only become known once
/// every subscriber has stopped, see [`super::totals::with_delivery_statistics`].
pub fn from_latencies(
    client_id: String,
    successes: u64,
    failures: u64,
    latencies_us: &[f64],
    elapsed: Duration,
) -> RunSummary {
    let publish = LatencyStatistics::from_samples(latencies_us);
    let run_time = elapsed.as_secs_f64();
    let msgs_per_sec = if run_time > 0.0 {
        successes as f64 / run_time
    } else {
        0.0
    };

    RunSummary {
        id: client_id,
        successes,
        failures,
        run_time,
        msg_time_min: publish.min,
        msg_time_max: publish.max,
        msg_time_mean: publish.mean,
        msg_time_std: publish.std_dev,
        msg_del_time_min: f64::NAN,
        msg_del_time_max: f64::NAN,
        msg_del_time_mean: f64::NAN,
        msg_del_time_std: f64::NAN,
        msgs_per_sec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_summarize_three_successful_publishes() {
        let summary = from_latencies(
            "pub-0".to_owned(),
            3,
            0,
            &[100.0, 200.0, 300.0],
            Duration::from_millis(500),
        );

        assert_eq!(summary.id, "pub-0");
        assert_eq!(summary.successes, 3);
        assert_eq!(summary.failures, 0);
        assert_eq!(summary.msg_time_min, 100.0);
        assert_eq!(summary.msg_time_max, 300.0);
        assert_eq!(summary.msg_time_mean, 200.0);
        assert_eq!(summary.run_time, 0.5);
        assert_eq!(summary.msgs_per_sec, 6.0);
        assert!(summary.msg_del_time_mean.is_nan());
    }

    #[test]
    fn should_report_no_throughput_for_failed_run() {
        let summary = from_latencies("pub-1".to_owned(), 0, 2, &[], Duration::from_secs(1));

        assert_eq!(summary.total_messages(), 2);
        assert_eq!(summary.msgs_per_sec, 0.0);
        assert!(summary.msg_time_mean.is_nan());
    }

    #[test]
    fn should_not_divide_by_zero_elapsed_time() {
        let summary = from_latencies("pub-2".to_owned(), 1, 0, &[5.0], Duration::ZERO);

        assert_eq!(summary.msgs_per_sec, 0.0);
    }
}
