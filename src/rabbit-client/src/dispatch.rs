use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
};

use lapin::BasicProperties;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    channel::{BrokerChannel, ChannelLease, ChannelPool},
    convert::BodyConverter,
    descriptor::ReturnShape,
    error::{ClientError, Result},
    resolver::{Arguments, PublishMetadata},
};

/// What a publishing call hands back to its caller.
#[derive(Debug)]
pub enum Dispatched {
    /// The message was handed to the channel; nothing to wait for.
    Sent,
    /// The broker has not confirmed yet.
    Confirming(PublishHandle),
}

/// Settles with the broker's verdict on a confirmed publish.
///
/// The publish runs on its own task and the channel is returned to the pool
/// when it finishes, whether or not anyone is still holding the handle.
#[derive(Debug)]
pub struct PublishHandle {
    exchange: String,
    routing_key: String,
    task: JoinHandle<Result<()>>,
}

impl PublishHandle {
    /// Gives up interest in the outcome. The publish still completes.
    pub fn detach(self) {}
}

impl Future for PublishHandle {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.task).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(_) => Poll::Ready(Err(ClientError::Interrupted {
                exchange: this.exchange.clone(),
                routing_key: this.routing_key.clone(),
            })),
        }
    }
}

/// Acquires a channel, converts the body and publishes.
pub struct Dispatcher<P: ChannelPool, C: BodyConverter> {
    pool: Arc<P>,
    converter: C,
}

impl<P: ChannelPool, C: BodyConverter> Dispatcher<P, C> {
    pub fn new(pool: Arc<P>, converter: C) -> Self {
        Self { pool, converter }
    }

    /// Publishes one resolved message.
    ///
    /// The channel is back in the pool before this returns for
    /// [`ReturnShape::Unit`], and once the broker answers for
    /// [`ReturnShape::Confirmed`]. Must be polled inside a tokio runtime.
    pub async fn publish(
        &self,
        metadata: PublishMetadata,
        properties: BasicProperties,
        arguments: &Arguments,
        shape: ReturnShape,
    ) -> Result<Dispatched> {
        let lease = match ChannelLease::acquire(self.pool.clone()).await {
            Ok(lease) => lease,
            Err(source) => {
                return Err(ClientError::ChannelAcquisition {
                    exchange: metadata.exchange,
                    routing_key: metadata.routing_key,
                    source,
                })
            }
        };

        let body = arguments
            .get(&metadata.body_argument)
            .unwrap_or(&Value::Null);
        let body = match self.converter.convert(body) {
            Ok(body) => body,
            Err(source) => {
                lease.release();
                return Err(ClientError::BodyConversion {
                    argument: metadata.body_argument,
                    exchange: metadata.exchange,
                    routing_key: metadata.routing_key,
                    source,
                });
            }
        };

        debug!(
            exchange = %metadata.exchange,
            routing_key = %metadata.routing_key,
            ?properties,
            "Sending a message"
        );

        let PublishMetadata {
            exchange,
            routing_key,
            ..
        } = metadata;

        match shape {
            ReturnShape::Unit => {
                debug!("Sending the message without confirms");
                let result = lease
                    .publish(&exchange, &routing_key, properties, &body)
                    .await;
                lease.release();

                result.map_err(|source| ClientError::Publish {
                    exchange,
                    routing_key,
                    source,
                })?;
                Ok(Dispatched::Sent)
            }
            ReturnShape::Confirmed => {
                debug!("Sending the message with confirms");
                let task = tokio::spawn({
                    let exchange = exchange.clone();
                    let routing_key = routing_key.clone();
                    async move {
                        let result = lease
                            .publish_confirmed(&exchange, &routing_key, properties, &body)
                            .await;
                        debug!("The publish has terminated");
                        lease.release();

                        result.map_err(|source| ClientError::Publish {
                            exchange,
                            routing_key,
                            source,
                        })
                    }
                });

                Ok(Dispatched::Confirming(PublishHandle {
                    exchange,
                    routing_key,
                    task,
                }))
            }
        }
    }
}
