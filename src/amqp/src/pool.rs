use std::sync::Mutex;

use anyhow::Context;
use lapin::options::ConfirmSelectOptions;
use rabbit_client::ChannelPool;
use tracing::{debug, warn};

use crate::{config::PoolConfig, publisher::AmqpChannel, AmqpConfig};

/// Hands out channels on a single connection, reusing idle ones.
pub struct LapinChannelPool {
    connection: lapin::Connection,
    config: PoolConfig,
    idle: Mutex<Vec<lapin::Channel>>,
}

impl LapinChannelPool {
    pub async fn connect(amqp: &AmqpConfig, config: PoolConfig) -> anyhow::Result<Self> {
        let connection =
            lapin::Connection::connect(&amqp.uri(), lapin::ConnectionProperties::default())
                .await
                .with_context(|| format!("failed to connect to {}:{}", amqp.host, amqp.port))?;
        Ok(Self::new_with(connection, config))
    }

    pub fn new(connection: lapin::Connection) -> Self {
        Self::new_with(connection, PoolConfig::default())
    }

    pub fn new_with(connection: lapin::Connection, config: PoolConfig) -> Self {
        Self {
            connection,
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn connection(&self) -> &lapin::Connection {
        &self.connection
    }

    pub fn idle(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or_default()
    }

    async fn open(&self) -> anyhow::Result<lapin::Channel> {
        let channel = self.connection.create_channel().await?;
        if self.config.publisher_confirmation {
            channel
                .confirm_select(ConfirmSelectOptions { nowait: false })
                .await?;
        }
        debug!(channel = channel.id(), "Opened a new channel");
        Ok(channel)
    }

    fn take_idle(&self) -> Option<lapin::Channel> {
        let mut idle = self.idle.lock().ok()?;
        while let Some(channel) = idle.pop() {
            if channel.status().connected() {
                return Some(channel);
            }
            warn!(channel = channel.id(), "Discarding a disconnected channel");
        }
        None
    }
}

impl ChannelPool for LapinChannelPool {
    type Channel = AmqpChannel;

    async fn acquire(&self) -> anyhow::Result<AmqpChannel> {
        let channel = match self.take_idle() {
            Some(channel) => channel,
            None => self.open().await?,
        };
        Ok(AmqpChannel { channel })
    }

    fn release(&self, channel: AmqpChannel) {
        let channel = channel.channel;
        if !channel.status().connected() {
            warn!(channel = channel.id(), "Dropping a disconnected channel");
            return;
        }

        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.config.max_idle {
                idle.push(channel);
                return;
            }
        }

        // Over capacity: close in the background if a runtime is around.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = channel.close(200, "pool is full").await {
                    warn!(channel = channel.id(), "Failed to close channel: {e}");
                }
            });
        }
    }
}
