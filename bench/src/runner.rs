use crate::actors::coordinator::ClientRunCoordinator;
use crate::actors::{ClientOutcome, ClientRole, PublisherRole, SubscriberRole};
use crate::analytics::delivery::DeliverySamples;
use crate::analytics::report_builder::BenchmarkReportBuilder;
use crate::client::ClientFactory;
use crate::error::BenchError;
use crate::plan::BenchmarkPlan;
use futures::future::join_all;
use human_repr::HumanCount;
use mqtt_bench_report::actor_kind::ActorKind;
use mqtt_bench_report::report::BenchmarkReport;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info};

pub struct BenchmarkRunner {
    client_factory: Arc<dyn ClientFactory>,
    plan: BenchmarkPlan,
}

impl BenchmarkRunner {
    pub fn new(client_factory: Arc<dyn ClientFactory>, plan: BenchmarkPlan) -> Self {
        Self {
            client_factory,
            plan,
        }
    }

    /// Starts every subscriber, waits until they are all listening, then
    /// starts the publishers and collects one summary from each of them.
    pub async fn run(self) -> Result<BenchmarkReport, BenchError> {
        self.plan.validate()?;
        let BenchmarkPlan {
            publishers,
            subscribers,
            message_count,
            message_size,
            params,
        } = self.plan;

        info!(
            "Starting benchmark: {} publishing {} messages of {} bytes to {}",
            params.format_actors_info(),
            params.total_messages().human_count_bare(),
            message_size,
            params.broker
        );
        let started = Instant::now();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut ready = Vec::with_capacity(subscribers.len());
        let mut subscriber_handles: Vec<JoinHandle<ClientOutcome>> =
            Vec::with_capacity(subscribers.len());
        for config in subscribers {
            let (ready_tx, ready_rx) = oneshot::channel();
            let coordinator = ClientRunCoordinator::new(
                self.client_factory.clone(),
                config,
                ActorKind::Subscriber,
            );
            let role = ClientRole::Subscriber(SubscriberRole {
                shutdown: shutdown_rx.clone(),
                ready: Some(ready_tx),
            });
            subscriber_handles.push(tokio::spawn(coordinator.run(role)));
            ready.push(ready_rx);
        }
        let ready = join_all(ready).await;
        let not_ready = ready.iter().filter(|result| result.is_err()).count();
        if not_ready > 0 {
            error!("{not_ready} subscribers stopped before they were ready");
        }
        info!("All {} subscribers are ready", ready.len());

        let expected_runs = publishers.len();
        let (results_tx, mut results_rx) = mpsc::channel(expected_runs.max(1));
        let mut publisher_handles = Vec::with_capacity(expected_runs);
        for config in publishers {
            let coordinator = ClientRunCoordinator::new(
                self.client_factory.clone(),
                config,
                ActorKind::Publisher,
            );
            let role = ClientRole::Publisher(PublisherRole {
                message_count,
                message_size,
                results: results_tx.clone(),
            });
            publisher_handles.push(tokio::spawn(coordinator.run(role)));
        }
        drop(results_tx);

        let mut runs = Vec::with_capacity(expected_runs);
        while runs.len() < expected_runs {
            match results_rx.recv().await {
                Some(run) => runs.push(run),
                None => {
                    error!(
                        "Only {} of {} publishers reported results",
                        runs.len(),
                        expected_runs
                    );
                    break;
                }
            }
        }
        let total_time = started.elapsed();
        info!("All publishers finished in {:.3} s", total_time.as_secs_f64());

        for result in join_all(publisher_handles).await {
            if let Err(error) = result {
                error!("Publisher task failed: {error}");
            }
        }

        let _ = shutdown_tx.send(true);
        let mut samples = DeliverySamples::default();
        for result in join_all(subscriber_handles).await {
            match result {
                Ok(ClientOutcome::Subscribed(subscriber_samples)) => {
                    samples.merge(subscriber_samples)
                }
                Ok(ClientOutcome::Published) => {}
                Err(error) => error!("Subscriber task failed: {error}"),
            }
        }
        info!(
            "Subscribers observed {} deliveries from {} publishers",
            samples.total().human_count_bare(),
            samples.publishers()
        );

        Ok(BenchmarkReportBuilder::build(
            params, runs, &samples, total_time,
        ))
    }
}
