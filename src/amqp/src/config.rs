use serde::Deserialize;

/// Where the broker lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AmqpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
}

impl AmqpConfig {
    pub fn uri(&self) -> String {
        let vhost = match self.vhost.as_str() {
            "/" | "" => "%2f",
            other => other,
        };
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, vhost
        )
    }
}

impl Default for AmqpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5672,
            user: "guest".into(),
            password: "guest".into(),
            vhost: "/".into(),
        }
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Put every new channel in confirm mode.
    pub publisher_confirmation: bool,
    /// Idle channels kept for reuse; extras are closed on release.
    pub max_idle: usize,
}

impl PoolConfig {
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_publisher_confirmation(mut self, enabled: bool) -> Self {
        self.publisher_confirmation = enabled;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            publisher_confirmation: true,
            max_idle: 8,
        }
    }
}
