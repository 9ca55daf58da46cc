//! Audit action labels

use serde::{Deserialize, Serialize};

/// What happened. Stored as its snake_case label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth
    PinCheckSuccess,
    PinCheckFailed,

    // Catalog and staff
    Create,
    Update,
    Delete,

    // Orders
    OrderCreated,
    OrderItemsAdded,
    OrderEdited,
    OrderStatusChanged,
    OrderCancelled,
    OrderRestored,
    DiscountApplied,
    DiscountRemoved,
    PaymentAdded,

    // System
    OrdersReset,
    BackupCreated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PinCheckSuccess => "pin_check_success",
            AuditAction::PinCheckFailed => "pin_check_failed",
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::OrderCreated => "order_created",
            AuditAction::OrderItemsAdded => "order_items_added",
            AuditAction::OrderEdited => "order_edited",
            AuditAction::OrderStatusChanged => "order_status_changed",
            AuditAction::OrderCancelled => "order_cancelled",
            AuditAction::OrderRestored => "order_restored",
            AuditAction::DiscountApplied => "discount_applied",
            AuditAction::DiscountRemoved => "discount_removed",
            AuditAction::PaymentAdded => "payment_added",
            AuditAction::OrdersReset => "orders_reset",
            AuditAction::BackupCreated => "backup_created",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
