pub mod actor_kind;
pub mod params;
pub mod report;
pub mod run_summary;
pub mod totals_summary;
