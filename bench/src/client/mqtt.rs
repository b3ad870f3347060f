use super::{BenchClient, ClientFactory, ConnectOptions, InboundMessage, InboundMessages};
use crate::error::BenchError;
use async_trait::async_trait;
use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, Request};
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const DEFAULT_MQTT_PORT: u16 = 1883;
const REQUEST_CHANNEL_CAPACITY: usize = 10;
const KEEP_ALIVE: Duration = Duration::from_secs(30);
/// Largest remaining length MQTT 3.1.1 can encode.
const MAX_PACKET_SIZE: usize = 268_435_455;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for BrokerAddress {
    type Err = BenchError;

    /// Accepts `tcp://host:port`, `mqtt://host:port` or a bare `host[:port]`.
    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let invalid = || BenchError::InvalidBrokerUrl(url.to_owned());
        let address = match url.split_once("://") {
            Some(("tcp" | "mqtt", rest)) => rest,
            Some(_) => return Err(invalid()),
            None => url,
        };
        let address = address.trim_end_matches('/');
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (address, DEFAULT_MQTT_PORT),
        };
        if host.is_empty() {
            return Err(invalid());
        }
        Ok(BrokerAddress {
            host: host.to_owned(),
            port,
        })
    }
}

pub struct MqttClientFactory {
    address: BrokerAddress,
}

impl MqttClientFactory {
    pub fn from_broker_url(url: &str) -> Result<Self, BenchError> {
        Ok(Self {
            address: url.parse()?,
        })
    }
}

#[async_trait]
impl ClientFactory for MqttClientFactory {
    async fn create_client(&self, options: ConnectOptions) -> Arc<dyn BenchClient> {
        Arc::new(MqttClient::new(&self.address, options))
    }
}

type Completion = oneshot::Sender<Result<(), BenchError>>;

struct PendingPublish {
    qos: QoS,
    done: Completion,
}

/// Matches broker acknowledgments to the publishes waiting for them by packet id.
///
/// rumqttc reports publishes in the order they were requested, and only then
/// reveals the packet id it assigned. Queued entries are waiting for that
/// event, in-flight entries for their PUBACK (QoS 1) or PUBCOMP (QoS 2).
#[derive(Default)]
struct AckTracker {
    queued: VecDeque<PendingPublish>,
    in_flight: HashMap<u16, PendingPublish>,
    subscription: Option<Completion>,
}

impl AckTracker {
    fn expect_publish(&mut self, qos: QoS) -> oneshot::Receiver<Result<(), BenchError>> {
        let (done, completion) = oneshot::channel();
        self.queued.push_back(PendingPublish { qos, done });
        completion
    }

    fn forget_last_publish(&mut self) {
        self.queued.pop_back();
    }

    fn expect_subscription(&mut self) -> oneshot::Receiver<Result<(), BenchError>> {
        let (done, completion) = oneshot::channel();
        self.subscription = Some(done);
        completion
    }

    fn on_publish_sent(&mut self, pkid: u16) {
        // Retransmission of a publish that is already waiting for its ack.
        if pkid != 0 && self.in_flight.contains_key(&pkid) {
            return;
        }
        let Some(publish) = self.queued.pop_front() else {
            return;
        };
        match publish.qos {
            QoS::AtMostOnce => {
                let _ = publish.done.send(Ok(()));
            }
            _ => {
                self.in_flight.insert(pkid, publish);
            }
        }
    }

    /// `qos` tells PUBACK (`AtLeastOnce`) from PUBCOMP (`ExactlyOnce`).
    fn on_acknowledged(&mut self, pkid: u16, qos: QoS) {
        if !self
            .in_flight
            .get(&pkid)
            .is_some_and(|publish| publish.qos == qos)
        {
            return;
        }
        if let Some(publish) = self.in_flight.remove(&pkid) {
            let _ = publish.done.send(Ok(()));
        }
    }

    /// SUBACKs of resubscriptions have nobody waiting and are dropped.
    fn on_subscribed(&mut self) {
        if let Some(done) = self.subscription.take() {
            let _ = done.send(Ok(()));
        }
    }

    fn on_connection_lost(&mut self, reason: &str) {
        let in_flight = self.in_flight.drain().map(|(_, publish)| publish);
        for publish in self.queued.drain(..).chain(in_flight) {
            let _ = publish
                .done
                .send(Err(BenchError::ConnectionLost(reason.to_owned())));
        }
        if let Some(done) = self.subscription.take() {
            let _ = done.send(Err(BenchError::SubscribeError(reason.to_owned())));
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.queued.is_empty() && self.in_flight.is_empty() && self.subscription.is_none()
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// rumqttc client driven by a background event loop task that reconnects on failure.
pub struct MqttClient {
    client_id: String,
    broker: String,
    quiet: bool,
    client: AsyncClient,
    event_loop: StdMutex<Option<EventLoop>>,
    connected: Arc<AtomicBool>,
    subscriptions: Arc<StdMutex<Vec<(String, QoS)>>>,
    acks: Arc<StdMutex<AckTracker>>,
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound: StdMutex<Option<InboundMessages>>,
    shutdown: watch::Sender<bool>,
}

impl MqttClient {
    pub fn new(address: &BrokerAddress, options: ConnectOptions) -> Self {
        let mut mqtt_options =
            MqttOptions::new(options.client_id.clone(), address.host.clone(), address.port);
        mqtt_options.set_clean_session(true);
        mqtt_options.set_keep_alive(KEEP_ALIVE);
        mqtt_options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);
        if let Some(credentials) = options.credentials {
            mqtt_options.set_credentials(credentials.username, credentials.password);
        }
        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Self {
            client_id: options.client_id,
            broker: format!("{}:{}", address.host, address.port),
            quiet: options.quiet,
            client,
            event_loop: StdMutex::new(Some(event_loop)),
            connected: Arc::new(AtomicBool::new(false)),
            subscriptions: Arc::new(StdMutex::new(Vec::new())),
            acks: Arc::new(StdMutex::new(AckTracker::default())),
            inbound_tx,
            inbound: StdMutex::new(Some(inbound)),
            shutdown,
        }
    }

    fn take_event_loop(&self) -> Option<EventLoop> {
        lock(&self.event_loop).take()
    }
}

#[async_trait]
impl BenchClient for MqttClient {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn connect(&self) -> Result<(), BenchError> {
        let Some(event_loop) = self.take_event_loop() else {
            return Ok(());
        };
        let (connack_tx, connack_rx) = oneshot::channel();
        let driver = EventLoopDriver {
            client_id: self.client_id.clone(),
            broker: self.broker.clone(),
            quiet: self.quiet,
            client: self.client.clone(),
            connected: self.connected.clone(),
            subscriptions: self.subscriptions.clone(),
            acks: self.acks.clone(),
            inbound: self.inbound_tx.clone(),
            connack: Some(connack_tx),
        };
        tokio::spawn(driver.run(event_loop, self.shutdown.subscribe()));
        match connack_rx.await {
            Ok(result) => result,
            Err(_) => Err(BenchError::ConnectError(
                "event loop stopped before the handshake finished".to_owned(),
            )),
        }
    }

    async fn publish(&self, topic: &str, qos: QoS, payload: Vec<u8>) -> Result<(), BenchError> {
        // The tracker lock orders this request against connection loss handling.
        let completion = {
            let mut acks = lock(&self.acks);
            if !self.connected.load(Ordering::Acquire) {
                return Err(BenchError::NotConnected);
            }
            let completion = acks.expect_publish(qos);
            if let Err(error) = self.client.try_publish(topic, qos, false, payload) {
                acks.forget_last_publish();
                return Err(BenchError::PublishError(error.to_string()));
            }
            completion
        };
        completion
            .await
            .unwrap_or_else(|_| Err(BenchError::ConnectionLost("event loop stopped".to_owned())))
    }

    /// Returns once the broker acknowledged the subscription.
    async fn subscribe(&self, topic: &str, qos: QoS) -> Result<InboundMessages, BenchError> {
        let (completion, inbound) = {
            let mut acks = lock(&self.acks);
            if !self.connected.load(Ordering::Acquire) {
                return Err(BenchError::NotConnected);
            }
            let mut slot = lock(&self.inbound);
            let Some(inbound) = slot.take() else {
                return Err(BenchError::SubscribeError("already subscribed".to_owned()));
            };
            let completion = acks.expect_subscription();
            if let Err(error) = self.client.try_subscribe(topic, qos) {
                acks.subscription = None;
                *slot = Some(inbound);
                return Err(BenchError::SubscribeError(error.to_string()));
            }
            (completion, inbound)
        };
        lock(&self.subscriptions).push((topic.to_owned(), qos));
        completion
            .await
            .unwrap_or_else(|_| Err(BenchError::SubscribeError("event loop stopped".to_owned())))?;
        Ok(inbound)
    }

    async fn disconnect(&self) {
        if self.connected.load(Ordering::Acquire) {
            if let Err(error) = self.client.disconnect().await {
                debug!("CLIENT {} cannot send disconnect: {error}", self.client_id);
            }
        }
        let _ = self.shutdown.send(true);
    }
}

struct EventLoopDriver {
    client_id: String,
    broker: String,
    quiet: bool,
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    subscriptions: Arc<StdMutex<Vec<(String, QoS)>>>,
    acks: Arc<StdMutex<AckTracker>>,
    inbound: mpsc::UnboundedSender<InboundMessage>,
    connack: Option<oneshot::Sender<Result<(), BenchError>>>,
}

impl EventLoopDriver {
    async fn run(mut self, mut event_loop: EventLoop, mut shutdown: watch::Receiver<bool>) {
        loop {
            let event = tokio::select! {
                event = event_loop.poll() => event,
                _ = shutdown.changed() => break,
            };
            match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => self.on_connected(),
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let _ = self.inbound.send(InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload,
                        received_at: Utc::now(),
                    });
                }
                Ok(Event::Incoming(Packet::PubAck(ack))) => {
                    lock(&self.acks).on_acknowledged(ack.pkid, QoS::AtLeastOnce);
                }
                Ok(Event::Incoming(Packet::PubComp(ack))) => {
                    lock(&self.acks).on_acknowledged(ack.pkid, QoS::ExactlyOnce);
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    lock(&self.acks).on_subscribed();
                }
                Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                    lock(&self.acks).on_publish_sent(pkid);
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => {}
                Err(error) => {
                    self.on_connection_error(&mut event_loop, error.to_string());
                    tokio::select! {
                        _ = sleep(RECONNECT_DELAY) => {}
                        _ = shutdown.changed() => break,
                    }
                }
            }
        }
        {
            let mut acks = lock(&self.acks);
            self.connected.store(false, Ordering::Release);
            acks.on_connection_lost("event loop stopped");
        }
        debug!("CLIENT {} event loop stopped", self.client_id);
    }

    fn on_connected(&mut self) {
        self.connected.store(true, Ordering::Release);
        if !self.quiet {
            info!(
                "CLIENT {} is connected to the broker {}",
                self.client_id, self.broker
            );
        }
        match self.connack.take() {
            Some(connack) => {
                let _ = connack.send(Ok(()));
            }
            None => self.resubscribe(),
        }
    }

    /// Clean sessions drop subscriptions on the broker side, restore them after a reconnect.
    fn resubscribe(&self) {
        let subscriptions = lock(&self.subscriptions).clone();
        for (topic, qos) in subscriptions {
            if let Err(error) = self.client.try_subscribe(topic.clone(), qos) {
                error!(
                    "CLIENT {} cannot resubscribe to {topic}: {error}",
                    self.client_id
                );
            }
        }
    }

    /// Publishes that were not acknowledged before the connection dropped are
    /// failed, not resent: the clean session they belonged to is gone.
    fn on_connection_error(&mut self, event_loop: &mut EventLoop, reason: String) {
        let was_connected = {
            let mut acks = lock(&self.acks);
            event_loop
                .pending
                .retain(|request| !matches!(request, Request::Publish(_) | Request::PubRel(_)));
            acks.on_connection_lost(&reason);
            self.connected.swap(false, Ordering::AcqRel)
        };
        if let Some(connack) = self.connack.take() {
            let _ = connack.send(Err(BenchError::ConnectError(reason)));
        } else if was_connected {
            warn!(
                "CLIENT {} lost connection to the broker: {reason}. Will reconnect...",
                self.client_id
            );
        } else {
            debug!("CLIENT {} reconnect attempt failed: {reason}", self.client_id);
        }
    }
}
