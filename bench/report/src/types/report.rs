use crate::params::BenchmarkParams;
use crate::run_summary::RunSummary;
use crate::totals_summary::TotalsSummary;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct BenchmarkReport {
    /// Benchmark unique identifier
    pub uuid: Uuid,

    /// Timestamp when the benchmark was finished
    pub timestamp: String,

    /// Benchmark parameters
    pub params: BenchmarkParams,

    /// Results per publishing client, in the order they finished
    pub runs: Vec<RunSummary>,

    /// Aggregate over all runs, absent when no publisher reported
    pub totals: Option<TotalsSummary>,
}

impl BenchmarkReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn dump_to_json(&self, path: &str) -> std::io::Result<()> {
        let path = Path::new(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let report_json = self.to_json_pretty()?;
        std::fs::write(path, report_json)
    }
}
