use thiserror::Error;

/// Failures surfaced to the caller of a declared publisher.
///
/// Every variant is terminal for the invocation that produced it; nothing
/// here is retried.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no routing key specified for method: {method}")]
    MissingRoutingKey { method: String },

    #[error("no valid message body argument found for method: {method}")]
    MissingBodyArgument { method: String },

    #[error(
        "attempted to set property [{name}], but could not match the name to any of the basic properties"
    )]
    UnknownProperty { name: String },

    #[error("invalid value for property [{name}]: {reason}")]
    InvalidPropertyValue { name: String, reason: String },

    #[error(
        "could not retrieve a channel from the pool to publish to exchange: [{exchange}] with routing key [{routing_key}]"
    )]
    ChannelAcquisition {
        exchange: String,
        routing_key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "could not convert the body argument [{argument}] to bytes for exchange: [{exchange}] and routing key [{routing_key}]"
    )]
    BodyConversion {
        argument: String,
        exchange: String,
        routing_key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to publish a message with exchange: [{exchange}] and routing key [{routing_key}]")]
    Publish {
        exchange: String,
        routing_key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The confirmation task ended without reporting an outcome.
    #[error("publish to exchange: [{exchange}] with routing key [{routing_key}] was interrupted")]
    Interrupted { exchange: String, routing_key: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;
