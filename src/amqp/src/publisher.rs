use lapin::{options::BasicPublishOptions, BasicProperties};
use rabbit_client::BrokerChannel;
use tracing::debug;

/// A lapin channel leased out by [`LapinChannelPool`](crate::LapinChannelPool).
pub struct AmqpChannel {
    pub(crate) channel: lapin::Channel,
}

impl AmqpChannel {
    pub fn is_connected(&self) -> bool {
        self.channel.status().connected()
    }

    pub fn id(&self) -> u16 {
        self.channel.id()
    }
}

impl BrokerChannel for AmqpChannel {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
    ) -> anyhow::Result<()> {
        let confirmation = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await?;

        // A confirm dropped unresolved is parked on the channel until
        // `wait_for_confirms`, which pooled channels never call.
        let channel = self.id();
        tokio::spawn(async move {
            match confirmation.await {
                Ok(confirmation) if confirmation.is_nack() => {
                    debug!(channel, "Broker rejected a fire-and-forget message");
                }
                Ok(_) => {}
                Err(e) => debug!(channel, "Fire-and-forget confirmation failed: {e}"),
            }
        });

        Ok(())
    }

    async fn publish_confirmed(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
    ) -> anyhow::Result<()> {
        let confirmation = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await?;

        let confirmation = confirmation.await?;
        anyhow::ensure!(
            confirmation.is_ack(),
            "broker did not acknowledge the message on channel {}",
            self.id()
        );

        Ok(())
    }
}
