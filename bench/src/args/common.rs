use super::defaults::*;
use super::output::OutputFormat;
use crate::client::qos_from_level;
use crate::error::BenchError;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use rumqttc::QoS;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct MqttBenchArgs {
    /// MQTT broker URL, e.g. tcp://host:1883
    #[arg(long, default_value_t = DEFAULT_BROKER_URL.to_owned())]
    pub broker: String,

    /// QoS level used for both publishing and subscribing
    #[arg(long, default_value_t = DEFAULT_QOS, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub qos: u8,

    /// Payload size of every message in bytes
    #[arg(long, default_value_t = DEFAULT_MESSAGE_SIZE)]
    pub size: u32,

    /// Number of messages sent by each publisher
    #[arg(long, default_value_t = DEFAULT_MESSAGE_COUNT)]
    pub count: u64,

    /// Number of concurrent publishers
    #[arg(long, default_value_t = DEFAULT_NUMBER_OF_PUBLISHERS)]
    pub pubs: u32,

    /// Number of concurrent subscribers
    #[arg(long, default_value_t = DEFAULT_NUMBER_OF_SUBSCRIBERS)]
    pub subs: u32,

    /// Result format printed to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Suppress per-client progress logs
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    /// Path of the JSON file holding channel and thing credentials
    #[arg(long, default_value_t = DEFAULT_CONNECTIONS_FILE.to_owned())]
    pub connections: String,

    /// Also write the JSON report to this path
    #[arg(long, short = 'o')]
    pub output: Option<String>,
}

impl MqttBenchArgs {
    pub fn validate(&self) {
        if self.pubs == 0 && self.subs == 0 {
            MqttBenchArgs::command()
                .error(
                    ErrorKind::ArgumentConflict,
                    "At least one publisher or subscriber is required, got --pubs 0 and --subs 0",
                )
                .exit();
        }
    }

    pub fn qos(&self) -> Result<QoS, BenchError> {
        qos_from_level(self.qos)
    }
}
