use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::{
    descriptor::{ParamDescriptor, PublisherDescriptor, StaticEntry},
    error::{ClientError, Result},
    registry::PropertyRegistry,
};

/// Live argument values of one call, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Everything needed to publish one message, minus the body bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishMetadata {
    pub exchange: String,
    pub routing_key: String,
    pub properties: BTreeMap<String, Value>,
    pub headers: BTreeMap<String, Value>,
    pub body_argument: String,
}

/// Resolves routing, body, headers and properties for one call.
///
/// Method-level declarations are applied first, then parameters in
/// declaration order; a later entry with the same name replaces an earlier
/// one. Property names are checked against `registry` here so that nothing
/// touches the network for a message that could never be built.
pub fn resolve(
    descriptor: &PublisherDescriptor,
    arguments: &Arguments,
    registry: &PropertyRegistry,
) -> Result<PublishMetadata> {
    let exchange = descriptor.exchange.clone().unwrap_or_default();
    let routing_key = routing_key(descriptor, arguments)?;
    let body_argument = body_argument(descriptor)
        .ok_or_else(|| ClientError::MissingBodyArgument {
            method: descriptor.method.clone(),
        })?
        .name
        .clone();

    let mut headers = BTreeMap::new();
    for (name, value) in static_entries(&descriptor.headers) {
        headers.insert(name, value);
    }

    let mut properties = BTreeMap::new();
    for (name, value) in static_entries(&descriptor.properties) {
        insert_property(&mut properties, registry, name, value)?;
    }

    for param in &descriptor.params {
        let Some(value) = arguments.get(&param.name).filter(|v| is_present(v)) else {
            continue;
        };
        if let Some(name) = param.header_name() {
            headers.insert(name.to_string(), value.clone());
        }
        if let Some(name) = param.property_name() {
            insert_property(&mut properties, registry, name.to_string(), value.clone())?;
        }
    }

    Ok(PublishMetadata {
        exchange,
        routing_key,
        properties,
        headers,
        body_argument,
    })
}

// Rejects the first unknown name in declaration order.
fn insert_property(
    properties: &mut BTreeMap<String, Value>,
    registry: &PropertyRegistry,
    name: String,
    value: Value,
) -> Result<()> {
    if !registry.contains(&name) {
        return Err(ClientError::UnknownProperty { name });
    }
    properties.insert(name, value);
    Ok(())
}

fn routing_key(descriptor: &PublisherDescriptor, arguments: &Arguments) -> Result<String> {
    let missing = || ClientError::MissingRoutingKey {
        method: descriptor.method.clone(),
    };

    if let Some(key) = &descriptor.routing_key {
        return Ok(key.clone());
    }

    let (param, declared) = descriptor
        .params
        .iter()
        .find_map(|p| p.routing_binding().map(|declared| (p, declared)))
        .ok_or_else(missing)?;

    let key = match declared {
        Some(key) => Some(key.clone()),
        None => arguments.get(&param.name).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }),
    };

    key.filter(|k| !k.is_empty()).ok_or_else(missing)
}

fn body_argument(descriptor: &PublisherDescriptor) -> Option<&ParamDescriptor> {
    descriptor
        .params
        .iter()
        .find(|p| p.is_body())
        .or_else(|| descriptor.params.iter().find(|p| p.is_unbound()))
}

fn static_entries(entries: &[StaticEntry]) -> impl Iterator<Item = (String, Value)> + '_ {
    entries.iter().filter_map(|entry| {
        let name = entry.effective_name().filter(|n| !n.is_empty())?;
        let value = entry.value.as_deref().filter(|v| !v.is_empty())?;
        Some((name.to_string(), Value::String(value.to_string())))
    })
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
