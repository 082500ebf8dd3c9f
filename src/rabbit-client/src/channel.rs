use std::{future::Future, ops::Deref, sync::Arc};

use lapin::BasicProperties;
use tracing::debug;

/// A leased handle able to put messages on the broker.
pub trait BrokerChannel: Send + Sync + 'static {
    /// Hands the message to the broker without waiting for a confirmation.
    fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Publishes and resolves once the broker has acknowledged the message.
    fn publish_confirmed(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Source of channels. Retry and timeout policy, if any, live here.
pub trait ChannelPool: Send + Sync + 'static {
    type Channel: BrokerChannel;

    fn acquire(&self) -> impl Future<Output = anyhow::Result<Self::Channel>> + Send;

    fn release(&self, channel: Self::Channel);
}

/// A channel checked out of a pool.
///
/// The channel goes back to the pool exactly once: on [`release`] or, if
/// that never happens, when the lease is dropped.
///
/// [`release`]: ChannelLease::release
pub struct ChannelLease<P: ChannelPool> {
    pool: Arc<P>,
    channel: Option<P::Channel>,
}

impl<P: ChannelPool> ChannelLease<P> {
    pub async fn acquire(pool: Arc<P>) -> anyhow::Result<Self> {
        debug!("Retrieving a channel from the pool");
        let channel = pool.acquire().await?;
        Ok(Self {
            pool,
            channel: Some(channel),
        })
    }

    pub fn release(mut self) {
        self.give_back();
    }

    fn give_back(&mut self) {
        if let Some(channel) = self.channel.take() {
            debug!("Returning the channel to the pool");
            self.pool.release(channel);
        }
    }
}

impl<P: ChannelPool> Deref for ChannelLease<P> {
    type Target = P::Channel;

    fn deref(&self) -> &Self::Target {
        self.channel
            .as_ref()
            .expect("channel is only taken when the lease is consumed")
    }
}

impl<P: ChannelPool> Drop for ChannelLease<P> {
    fn drop(&mut self) {
        self.give_back();
    }
}
