//! Declarative description of a publishing method.
//!
//! A [`PublisherDescriptor`] is assembled once, when a method is registered
//! with the [`Interceptor`](crate::Interceptor), and is read-only afterwards.
//! It records where the exchange, routing key, body, headers and properties
//! of each call come from.

/// How the caller expects the outcome of a publish to be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnShape {
    /// Fire-and-forget: the call returns once the message is handed to the
    /// channel, without waiting for the broker.
    #[default]
    Unit,
    /// The call returns a handle that settles when the broker confirms.
    Confirmed,
}

/// A `name`/`value` pair declared on the method itself.
///
/// Either half may be absent; such entries are dropped at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEntry {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl StaticEntry {
    /// The explicit name, falling back to the declared value.
    pub fn effective_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.value.as_deref())
    }
}

/// What a single parameter contributes to the outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    Body,
    /// Routing key: the static value when present, otherwise the argument.
    RoutingKey(Option<String>),
    /// Header named explicitly, or after the parameter.
    Header(Option<String>),
    /// Basic property named explicitly, or after the parameter.
    Property(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: String,
    pub bindings: Vec<ParamBinding>,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub fn body(self) -> Self {
        self.bind(ParamBinding::Body)
    }

    pub fn routing_key(self) -> Self {
        self.bind(ParamBinding::RoutingKey(None))
    }

    pub fn routing_key_value(self, value: impl Into<String>) -> Self {
        self.bind(ParamBinding::RoutingKey(Some(value.into())))
    }

    pub fn header(self) -> Self {
        self.bind(ParamBinding::Header(None))
    }

    pub fn header_named(self, name: impl Into<String>) -> Self {
        self.bind(ParamBinding::Header(Some(name.into())))
    }

    pub fn property(self) -> Self {
        self.bind(ParamBinding::Property(None))
    }

    pub fn property_named(self, name: impl Into<String>) -> Self {
        self.bind(ParamBinding::Property(Some(name.into())))
    }

    pub fn bind(mut self, binding: ParamBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn is_body(&self) -> bool {
        self.bindings.contains(&ParamBinding::Body)
    }

    /// A parameter with no bindings at all may carry the body by default.
    pub fn is_unbound(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn routing_binding(&self) -> Option<&Option<String>> {
        self.bindings.iter().find_map(|b| match b {
            ParamBinding::RoutingKey(value) => Some(value),
            _ => None,
        })
    }

    pub fn header_name(&self) -> Option<&str> {
        self.bindings.iter().find_map(|b| match b {
            ParamBinding::Header(name) => Some(self.bound_name(name)),
            _ => None,
        })
    }

    pub fn property_name(&self) -> Option<&str> {
        self.bindings.iter().find_map(|b| match b {
            ParamBinding::Property(name) => Some(self.bound_name(name)),
            _ => None,
        })
    }

    fn bound_name<'a>(&'a self, name: &'a Option<String>) -> &'a str {
        name.as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherDescriptor {
    pub method: String,
    pub exchange: Option<String>,
    pub routing_key: Option<String>,
    pub headers: Vec<StaticEntry>,
    pub properties: Vec<StaticEntry>,
    pub params: Vec<ParamDescriptor>,
    pub returns: ReturnShape,
}

impl PublisherDescriptor {
    pub fn builder(method: impl Into<String>) -> PublisherDescriptorBuilder {
        PublisherDescriptorBuilder {
            inner: PublisherDescriptor {
                method: method.into(),
                exchange: None,
                routing_key: None,
                headers: Vec::new(),
                properties: Vec::new(),
                params: Vec::new(),
                returns: ReturnShape::default(),
            },
        }
    }
}

pub struct PublisherDescriptorBuilder {
    inner: PublisherDescriptor,
}

impl PublisherDescriptorBuilder {
    pub fn exchange(mut self, exchange: impl Into<String>) -> Self {
        self.inner.exchange = Some(exchange.into());
        self
    }

    pub fn routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.inner.routing_key = Some(routing_key.into());
        self
    }

    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_entry(Some(name.into()), Some(value.into()))
    }

    pub fn header_entry(mut self, name: Option<String>, value: Option<String>) -> Self {
        self.inner.headers.push(StaticEntry { name, value });
        self
    }

    pub fn property(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.property_entry(Some(name.into()), Some(value.into()))
    }

    pub fn property_entry(mut self, name: Option<String>, value: Option<String>) -> Self {
        self.inner.properties.push(StaticEntry { name, value });
        self
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.inner.params.push(param);
        self
    }

    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.inner.returns = shape;
        self
    }

    pub fn build(self) -> PublisherDescriptor {
        self.inner
    }
}
