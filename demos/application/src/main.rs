mod model;
mod publisher;

use std::sync::Arc;

use amqp::{AmqpConfig, LapinChannelPool, PoolConfig};
use anyhow::Context;
use futures::StreamExt;
use lapin::{
    options::{
        BasicAckOptions, BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
    ExchangeKind,
};
use model::{events, OrderEvent};
use rabbit_client::{Arguments, Dispatched, Intercepted, Interceptor, Invocation};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const QUEUE: &str = "order-events";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AmqpConfig {
        host: std::env::var("AMQP_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
        ..AmqpConfig::default()
    };
    let pool = Arc::new(LapinChannelPool::connect(&config, PoolConfig::default()).await?);
    let consumer_channel = pool.connection().create_channel().await?;
    setup_amqp(&consumer_channel).await?;

    let interceptor = publisher::descriptors()
        .into_iter()
        .fold(Interceptor::new(pool.clone()), Interceptor::register);

    let n = 5;
    for i in 0..n {
        publish_order(&interceptor, i).await?;
    }

    // Not a publisher: forwarded as is.
    let forwarded = interceptor
        .intercept(
            Invocation::new("describe", Arguments::new().with("count", n)),
            |inv| async move {
                let count = inv.arguments.get("count").cloned().unwrap_or_default();
                format!("published {count} orders")
            },
        )
        .await?;
    if let Intercepted::Proceeded(summary) = forwarded {
        info!("{summary}");
    }

    let consumer = consumer_channel
        .basic_consume(
            QUEUE,
            "application-consumer",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;
    consume(consumer, n * 2).await
}

async fn publish_order(
    interceptor: &Interceptor<LapinChannelPool>,
    i: usize,
) -> anyhow::Result<()> {
    let order_id = Uuid::new_v4();

    let created = OrderEvent::Created(events::Created {
        event_id: Uuid::new_v4(),
        order_id,
        name: format!("name {i}"),
    });
    let args = Arguments::new()
        .with("event_id", created.event_id().to_string())
        .with("event", serde_json::to_value(&created)?);
    if let Intercepted::Published(Dispatched::Confirming(handle)) = interceptor
        .intercept(Invocation::new(publisher::ORDER_CREATED_METHOD, args), |_| async {})
        .await?
    {
        handle.await?;
        info!(%order_id, "Order created event confirmed");
    }

    let dispatched = OrderEvent::Dispatched(events::Dispatched {
        event_id: Uuid::new_v4(),
        order_id,
        dispatched_at: "2021-01-01".into(),
    });
    let args = Arguments::new()
        .with("routing_key", dispatched.routing_key())
        .with("event_id", dispatched.event_id().to_string())
        .with("trace", format!("order-{i}"))
        .with("event", serde_json::to_value(&dispatched)?);
    interceptor
        .intercept(Invocation::new(publisher::ORDER_EVENT_METHOD, args), |_| async {})
        .await?;

    Ok(())
}

async fn setup_amqp(ch: &lapin::Channel) -> anyhow::Result<()> {
    ch.exchange_declare(
        model::EXCHANGE,
        ExchangeKind::Topic,
        ExchangeDeclareOptions::default(),
        FieldTable::default(),
    )
    .await?;
    ch.queue_declare(
        QUEUE,
        QueueDeclareOptions::default(),
        FieldTable::default(),
    )
    .await?;
    for rk in [
        model::ORDER_CREATED,
        model::ORDER_DISPATCHED,
        model::ORDER_DELIVERED,
    ] {
        ch.queue_bind(
            QUEUE,
            model::EXCHANGE,
            rk,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;
    }
    Ok(())
}

async fn consume(mut consumer: lapin::Consumer, n: usize) -> anyhow::Result<()> {
    for _ in 0..n {
        let delivery = consumer.next().await.context("stream is closed")??;
        delivery.ack(BasicAckOptions::default()).await?;

        let event: OrderEvent = serde_json::from_slice(&delivery.data)?;
        info!(event_id = %event.event_id(), "Consumed event");
    }
    Ok(())
}
