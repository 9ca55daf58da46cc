//! Kitchen broadcast events
//!
//! Every event is a flat JSON object tagged by `type`, e.g.
//! `{"type":"order_cancelled","order_id":12}`. Listeners never reply.

use serde::{Deserialize, Serialize};

use crate::models::{Note, OrderStatus, OrderWithItems};

/// Name of the only broadcast group
pub const KITCHEN_GROUP: &str = "kitchen";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KitchenEvent {
    NewOrder {
        order_id: i64,
        order: Box<OrderWithItems>,
    },
    /// Items, table, staff or `estado` changed
    OrderUpdated {
        order_id: i64,
        total: f64,
        status: OrderStatus,
    },
    OrderCancelled {
        order_id: i64,
    },
    OrderRestored {
        order_id: i64,
    },
    NewNota {
        id: i64,
        nota: Note,
    },
    NotaDeleted {
        id: i64,
    },
    DiscountApplied {
        order_id: i64,
        discount_id: i64,
        total: f64,
    },
    DiscountRemoved {
        order_id: i64,
        discount_id: i64,
        total: f64,
    },
    PaymentAdded {
        order_id: i64,
        payment_id: i64,
        amount: f64,
        is_paid: bool,
    },
}

impl KitchenEvent {
    /// Wire name of the event (`type` field)
    pub fn kind(&self) -> &'static str {
        match self {
            KitchenEvent::NewOrder { .. } => "new_order",
            KitchenEvent::OrderUpdated { .. } => "order_updated",
            KitchenEvent::OrderCancelled { .. } => "order_cancelled",
            KitchenEvent::OrderRestored { .. } => "order_restored",
            KitchenEvent::NewNota { .. } => "new_nota",
            KitchenEvent::NotaDeleted { .. } => "nota_deleted",
            KitchenEvent::DiscountApplied { .. } => "discount_applied",
            KitchenEvent::DiscountRemoved { .. } => "discount_removed",
            KitchenEvent::PaymentAdded { .. } => "payment_added",
        }
    }
}
