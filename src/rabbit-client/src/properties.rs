use lapin::{
    types::{AMQPValue, FieldArray, FieldTable, LongString},
    BasicProperties,
};
use serde_json::Value;

use crate::{error::Result, registry::PropertyRegistry, resolver::PublishMetadata};

/// Accumulates properties and headers for a single message.
///
/// The builder is the only state touched while assembling, so a failure
/// simply discards it.
pub struct PropertiesBuilder<'a> {
    registry: &'a PropertyRegistry,
    properties: BasicProperties,
    headers: FieldTable,
}

impl<'a> PropertiesBuilder<'a> {
    pub fn new(registry: &'a PropertyRegistry) -> Self {
        Self {
            registry,
            properties: BasicProperties::default(),
            headers: FieldTable::default(),
        }
    }

    pub fn property(mut self, name: &str, value: &Value) -> Result<Self> {
        self.properties = self.registry.set_property(self.properties, name, value)?;
        Ok(self)
    }

    pub fn header(mut self, name: &str, value: &Value) -> Self {
        self.headers.insert(name.into(), amqp_value(value));
        self
    }

    pub fn build(self) -> BasicProperties {
        if self.headers.inner().is_empty() {
            self.properties
        } else {
            self.properties.with_headers(self.headers)
        }
    }
}

/// Builds the wire-level properties for resolved metadata, failing on the
/// first property the registry does not know.
pub fn build_properties(
    registry: &PropertyRegistry,
    metadata: &PublishMetadata,
) -> Result<BasicProperties> {
    let mut builder = PropertiesBuilder::new(registry);
    for (name, value) in &metadata.properties {
        builder = builder.property(name, value)?;
    }
    for (name, value) in &metadata.headers {
        builder = builder.header(name, value);
    }
    Ok(builder.build())
}

fn amqp_value(value: &Value) -> AMQPValue {
    match value {
        Value::Null => AMQPValue::Void,
        Value::Bool(b) => AMQPValue::Boolean(*b),
        // There is no unsigned 64-bit field type, so integers past
        // i64::MAX travel as their exact decimal text.
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => AMQPValue::LongLongInt(i),
            (None, Some(u)) => AMQPValue::LongString(LongString::from(u.to_string())),
            (None, None) => AMQPValue::Double(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => AMQPValue::LongString(LongString::from(s.as_str())),
        Value::Array(items) => {
            AMQPValue::FieldArray(FieldArray::from(items.iter().map(amqp_value).collect::<Vec<_>>()))
        }
        Value::Object(map) => {
            let mut table = FieldTable::default();
            for (k, v) in map {
                table.insert(k.as_str().into(), amqp_value(v));
            }
            AMQPValue::FieldTable(table)
        }
    }
}
