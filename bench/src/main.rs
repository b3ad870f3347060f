mod actors;
mod analytics;
mod args;
mod client;
mod error;
mod message;
mod plan;
mod runner;

use crate::args::common::MqttBenchArgs;
use crate::args::connections::Connections;
use crate::args::output::OutputFormat;
use crate::client::mqtt::MqttClientFactory;
use crate::error::BenchError;
use crate::plan::BenchmarkPlan;
use crate::runner::BenchmarkRunner;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[tokio::main]
async fn main() -> Result<(), BenchError> {
    let args = MqttBenchArgs::parse();
    let default_level = if args.quiet { "WARN" } else { "INFO" };
    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(default_level)))
        .init();
    args.validate();

    let client_factory = MqttClientFactory::from_broker_url(&args.broker)?;
    let connections = Connections::load_or_default(&args.connections);
    let plan = BenchmarkPlan::from_args(&args, &connections)?;

    let report = BenchmarkRunner::new(Arc::new(client_factory), plan)
        .run()
        .await?;

    match args.format {
        OutputFormat::Text => report.print_summary(),
        OutputFormat::Json => {
            let json = report
                .to_json_pretty()
                .map_err(|error| BenchError::CannotWriteReport(error.into()))?;
            println!("{json}");
        }
    }

    if let Some(output) = &args.output {
        report.dump_to_json(output)?;
        info!("Report written to {output}");
    }

    Ok(())
}
