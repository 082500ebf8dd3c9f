use std::collections::HashMap;

use lapin::{types::ShortString, BasicProperties};
use serde_json::Value;

use crate::error::{ClientError, Result};

type Setter = fn(BasicProperties, &str, &Value) -> Result<BasicProperties>;

/// Lookup table from well-known property names to setters on
/// [`BasicProperties`].
///
/// Built once and never mutated, so a single registry can be shared by
/// every concurrent publish.
pub struct PropertyRegistry {
    setters: HashMap<&'static str, Setter>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        let entries: [(&'static str, Setter); 13] = [
            ("contentType", |p, n, v| Ok(p.with_content_type(short(n, v)?))),
            ("contentEncoding", |p, n, v| {
                Ok(p.with_content_encoding(short(n, v)?))
            }),
            ("deliveryMode", |p, n, v| Ok(p.with_delivery_mode(octet(n, v)?))),
            ("priority", |p, n, v| Ok(p.with_priority(octet(n, v)?))),
            ("correlationId", |p, n, v| {
                Ok(p.with_correlation_id(short(n, v)?))
            }),
            ("replyTo", |p, n, v| Ok(p.with_reply_to(short(n, v)?))),
            ("expiration", |p, n, v| Ok(p.with_expiration(short(n, v)?))),
            ("messageId", |p, n, v| Ok(p.with_message_id(short(n, v)?))),
            ("timestamp", |p, n, v| Ok(p.with_timestamp(timestamp(n, v)?))),
            ("type", |p, n, v| Ok(p.with_kind(short(n, v)?))),
            ("userId", |p, n, v| Ok(p.with_user_id(short(n, v)?))),
            ("appId", |p, n, v| Ok(p.with_app_id(short(n, v)?))),
            ("clusterId", |p, n, v| Ok(p.with_cluster_id(short(n, v)?))),
        ];

        Self {
            setters: entries.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.setters.contains_key(name)
    }

    /// Applies `value` to the property registered under `name`.
    ///
    /// Names are matched exactly; anything outside the schema is an
    /// [`ClientError::UnknownProperty`].
    pub fn set_property(
        &self,
        builder: BasicProperties,
        name: &str,
        value: &Value,
    ) -> Result<BasicProperties> {
        let setter = self
            .setters
            .get(name)
            .ok_or_else(|| ClientError::UnknownProperty {
                name: name.to_string(),
            })?;
        setter(builder, name, value)
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> ClientError {
    ClientError::InvalidPropertyValue {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn short(name: &str, value: &Value) -> Result<ShortString> {
    match value {
        Value::String(s) => Ok(s.as_str().into()),
        Value::Number(n) => Ok(n.to_string().into()),
        Value::Bool(b) => Ok(b.to_string().into()),
        other => Err(invalid(name, format!("expected a string, got {other}"))),
    }
}

fn octet(name: &str, value: &Value) -> Result<u8> {
    let n = unsigned(value)
        .ok_or_else(|| invalid(name, format!("expected an integer, got {value}")))?;

    u8::try_from(n).map_err(|_| invalid(name, format!("{n} is out of range 0..=255")))
}

// Seconds since the Unix epoch.
fn timestamp(name: &str, value: &Value) -> Result<u64> {
    unsigned(value)
        .ok_or_else(|| invalid(name, format!("expected seconds since the epoch, got {value}")))
}

fn unsigned(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
