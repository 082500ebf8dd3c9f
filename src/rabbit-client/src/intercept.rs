use std::{collections::HashMap, future::Future, sync::Arc};

use tracing::debug;

use crate::{
    channel::ChannelPool,
    convert::{BodyConverter, JsonBodyConverter},
    descriptor::PublisherDescriptor,
    dispatch::{Dispatched, Dispatcher},
    error::Result,
    properties::build_properties,
    registry::PropertyRegistry,
    resolver::{self, Arguments},
};

/// One call arriving at the interceptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub method: String,
    pub arguments: Arguments,
}

impl Invocation {
    pub fn new(method: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

#[derive(Debug)]
pub enum Intercepted<T> {
    /// The call was a declared publisher and has been dispatched.
    Published(Dispatched),
    /// The call was forwarded untouched to the next handler.
    Proceeded(T),
}

/// Entry point turning calls on declared publisher methods into messages.
pub struct Interceptor<P: ChannelPool, C: BodyConverter = JsonBodyConverter> {
    publishers: HashMap<String, PublisherDescriptor>,
    registry: PropertyRegistry,
    dispatcher: Dispatcher<P, C>,
}

impl<P: ChannelPool> Interceptor<P> {
    pub fn new(pool: Arc<P>) -> Self {
        Self::with_converter(pool, JsonBodyConverter)
    }
}

impl<P: ChannelPool, C: BodyConverter> Interceptor<P, C> {
    pub fn with_converter(pool: Arc<P>, converter: C) -> Self {
        Self {
            publishers: HashMap::new(),
            registry: PropertyRegistry::new(),
            dispatcher: Dispatcher::new(pool, converter),
        }
    }

    /// Declares `descriptor.method` as a publisher, replacing any earlier
    /// declaration under the same name.
    pub fn register(mut self, descriptor: PublisherDescriptor) -> Self {
        self.publishers.insert(descriptor.method.clone(), descriptor);
        self
    }

    pub fn descriptor(&self, method: &str) -> Option<&PublisherDescriptor> {
        self.publishers.get(method)
    }

    /// Publishes if `invocation` targets a declared publisher, otherwise
    /// hands it to `next` and returns whatever that produces.
    pub async fn intercept<T, F, Fut>(
        &self,
        invocation: Invocation,
        next: F,
    ) -> Result<Intercepted<T>>
    where
        F: FnOnce(Invocation) -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(descriptor) = self.publishers.get(&invocation.method) else {
            return Ok(Intercepted::Proceeded(next(invocation).await));
        };

        let metadata = resolver::resolve(descriptor, &invocation.arguments, &self.registry)?;
        let properties = build_properties(&self.registry, &metadata)?;

        debug!(
            method = %descriptor.method,
            returns = ?descriptor.returns,
            "Dispatching publisher method"
        );

        let dispatched = self
            .dispatcher
            .publish(
                metadata,
                properties,
                &invocation.arguments,
                descriptor.returns,
            )
            .await?;

        Ok(Intercepted::Published(dispatched))
    }
}
