mod config;
mod pool;
mod publisher;

pub use config::{AmqpConfig, PoolConfig};
pub use pool::LapinChannelPool;
pub use publisher::AmqpChannel;

pub use lapin::{Connection, ConnectionProperties};
