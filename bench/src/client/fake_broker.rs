//! Loopback MQTT 3.1.1 broker that answers just enough of the protocol to
//! drive the rumqttc adapter. Every connection is numbered in accept order and
//! a policy decides how each PUBLISH or SUBSCRIBE is answered.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const CONNECT: u8 = 1;
const PUBLISH: u8 = 3;
const PUBREL: u8 = 6;
const SUBSCRIBE: u8 = 8;
const PINGREQ: u8 = 12;
const DISCONNECT: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet {
    Publish {
        qos: u8,
        pkid: u16,
        payload_len: usize,
    },
    Subscribe {
        pkid: u16,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Ignore,
    /// Drops the connection without answering.
    Disconnect,
    AckAndDisconnect,
}

type Policy = Arc<dyn Fn(usize, &Packet) -> Reply + Send + Sync>;
type Received = Arc<Mutex<Vec<(usize, Packet)>>>;

pub struct FakeBroker {
    address: SocketAddr,
    received: Received,
    acceptor: JoinHandle<()>,
}

impl FakeBroker {
    pub async fn start(policy: impl Fn(usize, &Packet) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let received = Received::default();
        let policy: Policy = Arc::new(policy);
        let log = received.clone();
        let acceptor = tokio::spawn(async move {
            let mut connection = 0;
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, connection, policy.clone(), log.clone()));
                connection += 1;
            }
        });
        Self {
            address,
            received,
            acceptor,
        }
    }

    pub async fn acking_everything() -> Self {
        Self::start(|_, _| Reply::Ack).await
    }

    pub fn address(&self) -> String {
        self.address.to_string()
    }

    /// Publishes and subscriptions seen so far, tagged with their connection number.
    pub fn received(&self) -> Vec<(usize, Packet)> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for FakeBroker {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    connection: usize,
    policy: Policy,
    received: Received,
) -> io::Result<()> {
    loop {
        let (header, body) = read_packet(&mut stream).await?;
        let packet = match header >> 4 {
            CONNECT => {
                stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await?;
                continue;
            }
            PUBLISH => {
                let qos = (header >> 1) & 0b11;
                let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                let mut offset = 2 + topic_len;
                let mut pkid = 0;
                if qos > 0 {
                    pkid = u16::from_be_bytes([body[offset], body[offset + 1]]);
                    offset += 2;
                }
                Packet::Publish {
                    qos,
                    pkid,
                    payload_len: body.len() - offset,
                }
            }
            PUBREL => {
                stream.write_all(&[0x70, 0x02, body[0], body[1]]).await?;
                continue;
            }
            SUBSCRIBE => Packet::Subscribe {
                pkid: u16::from_be_bytes([body[0], body[1]]),
            },
            PINGREQ => {
                stream.write_all(&[0xD0, 0x00]).await?;
                continue;
            }
            DISCONNECT => return Ok(()),
            _ => continue,
        };

        received.lock().unwrap().push((connection, packet));
        let reply = policy(connection, &packet);
        if matches!(reply, Reply::Disconnect) {
            return Ok(());
        }
        if matches!(reply, Reply::Ack | Reply::AckAndDisconnect) {
            stream.write_all(&acknowledgment(&packet)).await?;
        }
        if matches!(reply, Reply::AckAndDisconnect) {
            return Ok(());
        }
    }
}

fn acknowledgment(packet: &Packet) -> Vec<u8> {
    match *packet {
        Packet::Publish { qos: 0, .. } => Vec::new(),
        Packet::Publish { qos: 1, pkid, .. } => [0x40, 0x02].into_iter().chain(pkid.to_be_bytes()).collect(),
        // PUBREC, the client answers with PUBREL and gets PUBCOMP back.
        Packet::Publish { pkid, .. } => [0x50, 0x02].into_iter().chain(pkid.to_be_bytes()).collect(),
        Packet::Subscribe { pkid } => [0x90, 0x03]
            .into_iter()
            .chain(pkid.to_be_bytes())
            .chain([0x01])
            .collect(),
    }
}

async fn read_packet(stream: &mut TcpStream) -> io::Result<(u8, Vec<u8>)> {
    let header = stream.read_u8().await?;
    let mut remaining = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await?;
        remaining |= ((byte & 0x7F) as usize) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    let mut body = vec![0; remaining];
    stream.read_exact(&mut body).await?;
    Ok((header, body))
}
