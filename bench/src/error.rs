use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Cannot read connections file {path}: {reason}")]
    CannotReadConnections { path: String, reason: String },
    #[error("Cannot connect to the broker: {0}")]
    ConnectError(String),
    #[error("Not connected")]
    NotConnected,
    #[error("Cannot publish message: {0}")]
    PublishError(String),
    #[error("Cannot subscribe: {0}")]
    SubscribeError(String),
    #[error("Cannot decode message payload")]
    DecodeError(#[from] serde_json::Error),
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
    #[error("Cannot write report")]
    CannotWriteReport(#[from] std::io::Error),
}
