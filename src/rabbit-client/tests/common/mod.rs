use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use rabbit_client::{BasicProperties, BrokerChannel, ChannelPool};
use tokio::sync::Notify;

pub const MOCK_EXCHANGE: &str = "mock-exchange";
pub const MOCK_ROUTING_KEY: &str = "mock-rk";

#[derive(Debug, Clone)]
pub struct Published {
    pub channel: usize,
    pub exchange: String,
    pub routing_key: String,
    pub properties: BasicProperties,
    pub body: Vec<u8>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behaviour {
    #[default]
    Succeed,
    FailAcquire,
    FailPublish,
}

/// Shared record of everything the pool and its channels were asked to do.
#[derive(Default)]
pub struct Recorder {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub published: Mutex<Vec<Published>>,
}

impl Recorder {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    /// Waits for background confirmations to hand their channel back.
    pub async fn wait_for_releases(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.released() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("channel was not released in time");
    }
}

pub struct RecordingPool {
    pub recorder: Arc<Recorder>,
    pub behaviour: Behaviour,
    /// When set, confirmed publishes wait for a permit before settling.
    pub gate: Option<Arc<Notify>>,
}

impl RecordingPool {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            recorder: Arc::new(Recorder::default()),
            behaviour,
            gate: None,
        }
    }

    pub fn gated(behaviour: Behaviour) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let pool = Self {
            gate: Some(gate.clone()),
            ..Self::new(behaviour)
        };
        (pool, gate)
    }
}

pub struct RecordingChannel {
    id: usize,
    recorder: Arc<Recorder>,
    behaviour: Behaviour,
    gate: Option<Arc<Notify>>,
}

impl RecordingChannel {
    fn record(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
        confirmed: bool,
    ) -> anyhow::Result<()> {
        if self.behaviour == Behaviour::FailPublish {
            anyhow::bail!("broker refused the message");
        }
        self.recorder.published.lock().unwrap().push(Published {
            channel: self.id,
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            properties,
            body: body.to_vec(),
            confirmed,
        });
        Ok(())
    }
}

impl BrokerChannel for RecordingChannel {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
    ) -> anyhow::Result<()> {
        self.record(exchange, routing_key, properties, body, false)
    }

    async fn publish_confirmed(
        &self,
        exchange: &str,
        routing_key: &str,
        properties: BasicProperties,
        body: &[u8],
    ) -> anyhow::Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.record(exchange, routing_key, properties, body, true)
    }
}

impl ChannelPool for RecordingPool {
    type Channel = RecordingChannel;

    async fn acquire(&self) -> anyhow::Result<RecordingChannel> {
        if self.behaviour == Behaviour::FailAcquire {
            anyhow::bail!("connection is closed");
        }
        let id = self.recorder.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingChannel {
            id,
            recorder: self.recorder.clone(),
            behaviour: self.behaviour,
            gate: self.gate.clone(),
        })
    }

    fn release(&self, _channel: RecordingChannel) {
        self.recorder.released.fetch_add(1, Ordering::SeqCst);
    }
}
