//! Orders
//!
//! - **money**: pure total/payment arithmetic over `Decimal`
//! - **lock**: per-order async mutex
//! - **service**: transactional order mutations with in-transaction recalculation

pub mod lock;
pub mod money;
pub mod service;

pub use lock::OrderLocks;
pub use service::{OrderService, Recalculated, recalculate_totals};
