pub mod delivery;
pub mod metrics;
pub mod report_builder;
pub mod statistics;
