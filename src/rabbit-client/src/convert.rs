use serde_json::Value;

/// Turns a body argument into the bytes put on the wire.
pub trait BodyConverter: Send + Sync + 'static {
    fn convert(&self, value: &Value) -> anyhow::Result<Vec<u8>>;
}

/// Strings go out as their UTF-8 bytes, everything else as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyConverter;

impl BodyConverter for JsonBodyConverter {
    fn convert(&self, value: &Value) -> anyhow::Result<Vec<u8>> {
        match value {
            Value::Null => anyhow::bail!("no value supplied for the message body"),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Ok(serde_json::to_vec(other)?),
        }
    }
}
