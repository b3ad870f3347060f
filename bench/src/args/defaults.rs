pub const DEFAULT_BROKER_URL: &str = "tcp://localhost:1883";
pub const DEFAULT_QOS: u8 = 1;
pub const DEFAULT_MESSAGE_SIZE: u32 = 100;
pub const DEFAULT_MESSAGE_COUNT: u64 = 100;
pub const DEFAULT_NUMBER_OF_PUBLISHERS: u32 = 20;
pub const DEFAULT_NUMBER_OF_SUBSCRIBERS: u32 = 1;
pub const DEFAULT_CONNECTIONS_FILE: &str = "connections.json";

/// Channel used when no connections file could be loaded.
pub const DEFAULT_CHANNEL_ID: &str = "default";
