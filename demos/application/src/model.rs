use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EXCHANGE: &str = "orders";
pub const ORDER_CREATED: &str = "order.created";
pub const ORDER_DISPATCHED: &str = "order.dispatched";
pub const ORDER_DELIVERED: &str = "order.delivered";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created(events::Created),
    Dispatched(events::Dispatched),
    Delivered(events::Delivered),
}

impl OrderEvent {
    pub fn event_id(&self) -> Uuid {
        match self {
            OrderEvent::Created(e) => e.event_id,
            OrderEvent::Dispatched(e) => e.event_id,
            OrderEvent::Delivered(e) => e.event_id,
        }
    }

    pub fn routing_key(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => ORDER_CREATED,
            OrderEvent::Dispatched(_) => ORDER_DISPATCHED,
            OrderEvent::Delivered(_) => ORDER_DELIVERED,
        }
    }
}

pub mod events {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Created {
        pub event_id: Uuid,
        pub order_id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Dispatched {
        pub event_id: Uuid,
        pub order_id: Uuid,
        pub dispatched_at: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Delivered {
        pub event_id: Uuid,
        pub order_id: Uuid,
        pub delivered_at: String,
    }
}
