use std::sync::Arc;

use amqp::{AmqpConfig, LapinChannelPool, PoolConfig};
use futures::StreamExt;
use lapin::{
    options::{
        BasicAckOptions, BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions, QueuePurgeOptions,
    },
    types::{AMQPValue, FieldTable, ShortString},
    ExchangeKind,
};
use rabbit_client::{
    Arguments, ChannelPool, Dispatched, Intercepted, Interceptor, Invocation, ParamDescriptor,
    PublisherDescriptor, ReturnShape,
};
use serde_json::json;

const TEST_EXCHANGE: &str = "test-exchange";
const TEST_QUEUE: &str = "test-queue";
const TEST_ROUTING_KEY: &str = "test-routing-key";

async fn setup_amqp(ch: &lapin::Channel) {
    ch.exchange_declare(
        TEST_EXCHANGE,
        ExchangeKind::Topic,
        ExchangeDeclareOptions::default(),
        FieldTable::default(),
    )
    .await
    .unwrap();
    ch.queue_declare(
        TEST_QUEUE,
        QueueDeclareOptions {
            auto_delete: true,
            ..QueueDeclareOptions::default()
        },
        FieldTable::default(),
    )
    .await
    .unwrap();
    ch.queue_bind(
        TEST_QUEUE,
        TEST_EXCHANGE,
        TEST_ROUTING_KEY,
        QueueBindOptions::default(),
        FieldTable::default(),
    )
    .await
    .unwrap();
}

fn descriptor(method: &str, returns: ReturnShape) -> PublisherDescriptor {
    PublisherDescriptor::builder(method)
        .exchange(TEST_EXCHANGE)
        .routing_key(TEST_ROUTING_KEY)
        .header("x-env", "test")
        .property("contentType", "application/json")
        .param(ParamDescriptor::new("payload").body())
        .param(ParamDescriptor::new("trace").header())
        .returns(returns)
        .build()
}

#[tokio::test]
#[ignore = "requires a broker on 127.0.0.1:5672"]
async fn publish() {
    let pool = Arc::new(
        LapinChannelPool::connect(&AmqpConfig::default(), PoolConfig::default())
            .await
            .unwrap(),
    );
    let consumer_channel = pool.connection().create_channel().await.unwrap();
    setup_amqp(&consumer_channel).await;

    let interceptor = Interceptor::new(pool.clone())
        .register(descriptor("fire", ReturnShape::Unit))
        .register(descriptor("confirm", ReturnShape::Confirmed));

    let args = Arguments::new()
        .with("payload", json!({"greeting": "Hello, world!"}))
        .with("trace", "abc123");

    let sent = interceptor
        .intercept(Invocation::new("fire", args.clone()), |_| async {})
        .await
        .unwrap();
    assert!(matches!(sent, Intercepted::Published(Dispatched::Sent)));

    let Intercepted::Published(Dispatched::Confirming(handle)) = interceptor
        .intercept(Invocation::new("confirm", args), |_| async {})
        .await
        .unwrap()
    else {
        panic!("expected a confirmation handle");
    };
    handle.await.unwrap();

    let mut consumer = consumer_channel
        .basic_consume(
            TEST_QUEUE,
            "test-consumer",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .unwrap();

    for _ in 0..2 {
        let Some(delivery) = consumer.next().await else {
            panic!("stream is closed")
        };
        let delivery = delivery.expect("error in consumer");
        delivery.ack(BasicAckOptions::default()).await.expect("ack");

        let body: serde_json::Value = serde_json::from_slice(&delivery.data).unwrap();
        assert_eq!(body, json!({"greeting": "Hello, world!"}));

        let headers = delivery.properties.headers().as_ref().unwrap().inner();
        assert_eq!(
            headers.get(&ShortString::from("trace")),
            Some(&AMQPValue::LongString("abc123".into()))
        );
    }

    // both channels are back in the pool
    assert!(pool.idle() >= 1);
    let channel = pool.acquire().await.unwrap();
    assert!(channel.is_connected());
    pool.release(channel);
}

#[tokio::test]
#[ignore = "requires a broker on 127.0.0.1:5672"]
async fn many_unit_publishes_reuse_one_confirming_channel() {
    let pool = Arc::new(
        LapinChannelPool::connect(
            &AmqpConfig::default(),
            PoolConfig::default().with_max_idle(1),
        )
        .await
        .unwrap(),
    );
    let consumer_channel = pool.connection().create_channel().await.unwrap();
    setup_amqp(&consumer_channel).await;
    consumer_channel
        .queue_purge(TEST_QUEUE, QueuePurgeOptions::default())
        .await
        .unwrap();

    let interceptor = Interceptor::new(pool.clone())
        .register(descriptor("fire", ReturnShape::Unit))
        .register(descriptor("confirm", ReturnShape::Confirmed));

    let first = pool.acquire().await.unwrap();
    let channel_id = first.id();
    pool.release(first);

    let n = 500;
    for i in 0..n {
        let args = Arguments::new()
            .with("payload", json!({"seq": i}))
            .with("trace", format!("t-{i}"));
        let sent = interceptor
            .intercept(Invocation::new("fire", args), |_| async {})
            .await
            .unwrap();
        assert!(matches!(sent, Intercepted::Published(Dispatched::Sent)));
    }
    assert_eq!(pool.idle(), 1);

    // the same channel still confirms promptly after the burst
    let args = Arguments::new()
        .with("payload", json!({"seq": n}))
        .with("trace", "last");
    let Intercepted::Published(Dispatched::Confirming(handle)) = interceptor
        .intercept(Invocation::new("confirm", args), |_| async {})
        .await
        .unwrap()
    else {
        panic!("expected a confirmation handle");
    };
    handle.await.unwrap();

    let channel = pool.acquire().await.unwrap();
    assert_eq!(channel.id(), channel_id);
    pool.release(channel);

    let mut consumer = consumer_channel
        .basic_consume(
            TEST_QUEUE,
            "burst-consumer",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .unwrap();
    for _ in 0..=n {
        let delivery = consumer
            .next()
            .await
            .expect("stream is closed")
            .expect("error in consumer");
        delivery.ack(BasicAckOptions::default()).await.expect("ack");
    }
}
