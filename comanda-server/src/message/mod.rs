//! Kitchen messaging
//!
//! [`KitchenHub`] fans committed order and note changes out to every
//! connected kitchen screen.

pub mod hub;

pub use hub::{BroadcastReport, ChannelListener, DeliveryError, KitchenHub, LISTENER_QUEUE, Listener};
