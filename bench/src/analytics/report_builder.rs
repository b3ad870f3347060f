use super::delivery::DeliverySamples;
use super::metrics::totals::{calculate_totals, with_delivery_statistics};
use chrono::{SecondsFormat, Utc};
use mqtt_bench_report::{params::BenchmarkParams, report::BenchmarkReport, run_summary::RunSummary};
use std::time::Duration;

pub struct BenchmarkReportBuilder;

impl BenchmarkReportBuilder {
    pub fn build(
        params: BenchmarkParams,
        runs: Vec<RunSummary>,
        samples: &DeliverySamples,
        total_time: Duration,
    ) -> BenchmarkReport {
        let uuid = uuid::Uuid::new_v4();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let totals = calculate_totals(&runs, samples, total_time);
        let runs = with_delivery_statistics(&runs, samples);

        BenchmarkReport {
            uuid,
            timestamp,
            params,
            runs,
            totals,
        }
    }
}
