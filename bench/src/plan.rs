use crate::actors::ClientConfig;
use crate::args::common::MqttBenchArgs;
use crate::args::connections::Connections;
use crate::client::qos_level;
use crate::error::BenchError;
use mqtt_bench_report::params::BenchmarkParams;

/// Everything needed to start the clients of one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkPlan {
    pub publishers: Vec<ClientConfig>,
    pub subscribers: Vec<ClientConfig>,
    pub message_count: u64,
    pub message_size: usize,
    pub params: BenchmarkParams,
}

impl BenchmarkPlan {
    pub fn from_args(args: &MqttBenchArgs, connections: &Connections) -> Result<Self, BenchError> {
        let qos = args.qos()?;
        let clients = |count: u32| -> Vec<ClientConfig> {
            (0..count)
                .map(|index| ClientConfig {
                    index,
                    topic: connections.topic_for(index),
                    qos,
                    credentials: connections.credentials_for(index),
                    quiet: args.quiet,
                })
                .collect()
        };

        let identifier = hostname::get()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_owned());
        let params = BenchmarkParams::new(
            identifier,
            args.broker.clone(),
            qos_level(qos),
            args.size,
            args.count,
            args.pubs,
            args.subs,
        );

        Ok(Self {
            publishers: clients(args.pubs),
            subscribers: clients(args.subs),
            message_count: args.count,
            message_size: args.size as usize,
            params,
        })
    }

    #[cfg(test)]
    pub fn uniform(
        publishers: u32,
        subscribers: u32,
        message_count: u64,
        message_size: usize,
        qos: rumqttc::QoS,
        connections: &Connections,
    ) -> Self {
        let client = |index: u32| ClientConfig {
            index,
            topic: connections.topic_for(index),
            qos,
            credentials: connections.credentials_for(index),
            quiet: true,
        };
        Self {
            publishers: (0..publishers).map(client).collect(),
            subscribers: (0..subscribers).map(client).collect(),
            message_count,
            message_size,
            params: BenchmarkParams {
                qos: qos_level(qos),
                message_size: message_size as u32,
                message_count,
                publishers,
                subscribers,
                ..Default::default()
            },
        }
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.publishers.is_empty() && self.subscribers.is_empty() {
            return Err(BenchError::InvalidConfiguration(
                "at least one publisher or subscriber is required".to_owned(),
            ));
        }
        Ok(())
    }
}
