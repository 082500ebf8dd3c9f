use rabbit_client::{ParamDescriptor, PublisherDescriptor, ReturnShape};

use crate::model::{EXCHANGE, ORDER_CREATED};

pub const ORDER_CREATED_METHOD: &str = "order_created";
pub const ORDER_EVENT_METHOD: &str = "order_event";

/// Created events wait for the broker; the rest are fire-and-forget with
/// the routing key taken from the call.
pub fn descriptors() -> [PublisherDescriptor; 2] {
    [
        PublisherDescriptor::builder(ORDER_CREATED_METHOD)
            .exchange(EXCHANGE)
            .routing_key(ORDER_CREATED)
            .header("x-source", "application")
            .property("contentType", "application/json")
            .property("deliveryMode", "2")
            .param(ParamDescriptor::new("event").body())
            .param(ParamDescriptor::new("event_id").property_named("messageId"))
            .returns(ReturnShape::Confirmed)
            .build(),
        PublisherDescriptor::builder(ORDER_EVENT_METHOD)
            .exchange(EXCHANGE)
            .property("contentType", "application/json")
            .param(ParamDescriptor::new("routing_key").routing_key())
            .param(ParamDescriptor::new("event"))
            .param(ParamDescriptor::new("event_id").property_named("messageId"))
            .param(ParamDescriptor::new("trace").header_named("x-trace"))
            .build(),
    ]
}
