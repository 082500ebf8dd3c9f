pub mod channel;
pub mod convert;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod intercept;
pub mod properties;
pub mod registry;
pub mod resolver;

pub use channel::{BrokerChannel, ChannelLease, ChannelPool};
pub use convert::{BodyConverter, JsonBodyConverter};
pub use descriptor::{ParamBinding, ParamDescriptor, PublisherDescriptor, ReturnShape};
pub use dispatch::{Dispatched, Dispatcher, PublishHandle};
pub use error::{ClientError, Result};
pub use intercept::{Intercepted, Interceptor, Invocation};
pub use resolver::{Arguments, PublishMetadata};

pub use lapin::BasicProperties;
