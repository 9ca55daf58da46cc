//! HTTP routes
//!
//! | Module | Prefix | Notes |
//! |--------|--------|-------|
//! | [`health`] | /api/health | open |
//! | [`auth`] | /api/auth | PIN check, rate limited |
//! | [`users`] | /api/users | writes need admin |
//! | [`tables`] | /api/tables | writes need admin |
//! | [`categories`] | /api/categories | writes need admin |
//! | [`products`] | /api/products | writes need admin |
//! | [`modifiers`] | /api/modifiers | writes need admin |
//! | [`orders`] | /api/orders | edit needs admin |
//! | [`discounts`] | /api/orders/{id}/discounts, /api/discounts | writes need admin |
//! | [`payments`] | /api/orders/{id}/payments | open |
//! | [`notes`] | /api/notes | open |
//! | [`reports`] | /api/reports | admin |
//! | [`audit_log`] | /api/audit-log | admin |
//! | [`kitchen`] | /ws/kitchen | WebSocket |

pub mod extract;

pub mod audit_log;
pub mod auth;
pub mod categories;
pub mod discounts;
pub mod health;
pub mod kitchen;
pub mod modifiers;
pub mod notes;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;
pub mod tables;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

use axum::Router;

use crate::core::ServerState;

pub use extract::{ApiJson, ApiQuery};

/// Every route of the server, each registered once
pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(users::router())
        .merge(tables::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(modifiers::router())
        .merge(orders::router())
        .merge(discounts::router())
        .merge(payments::router())
        .merge(notes::router())
        .merge(reports::router())
        .merge(audit_log::router())
        .merge(kitchen::router())
}
