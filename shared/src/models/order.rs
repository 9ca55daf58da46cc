//! Order Model
//!
//! An order (comanda) is one table visit. Item and modifier rows snapshot
//! names and prices at creation so later catalog edits never change history.

use serde::{Deserialize, Serialize};

use super::{Discount, Payment};

/// Kitchen workflow state (estado)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum OrderStatus {
    #[serde(rename = "pendiente", alias = "pending")]
    #[cfg_attr(feature = "db", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "listo", alias = "ready")]
    #[cfg_attr(feature = "db", sqlx(rename = "listo"))]
    Ready,
    #[serde(rename = "cobrado", alias = "paid")]
    #[cfg_attr(feature = "db", sqlx(rename = "cobrado"))]
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pendiente",
            OrderStatus::Ready => "listo",
            OrderStatus::Paid => "cobrado",
        }
    }

    /// Parse a stored or client-supplied label, accepting English aliases
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "pendiente" | "pending" => Some(OrderStatus::Pending),
            "listo" | "ready" => Some(OrderStatus::Ready),
            "cobrado" | "paid" => Some(OrderStatus::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order header. `subtotal`, `discount_total` and `total` are derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    /// Joined from dining_tables
    pub table_name: Option<String>,
    pub user_id: Option<i64>,
    /// Staff name snapshot (mozo)
    pub staff_name: Option<String>,
    pub status: OrderStatus,
    pub subtotal: f64,
    pub discount_total: f64,
    pub total: f64,
    /// Anulada
    pub is_cancelled: bool,
    /// Pagado
    pub is_paid: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub notes: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemModifier {
    pub id: i64,
    pub order_item_id: i64,
    pub modifier_id: Option<i64>,
    pub modifier_name: String,
    pub extra_price: f64,
}

/// Item together with its modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub modifiers: Vec<OrderItemModifier>,
}

/// Order with its lines, as listed to the kitchen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// Full order view including discounts and payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub discounts: Vec<Discount>,
    pub payments: Vec<Payment>,
    pub paid_amount: f64,
}

fn default_quantity() -> i64 {
    1
}

/// One requested line. No `product_id` means a free-form line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Option<i64>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub notes: Option<String>,
    #[serde(default)]
    pub modifier_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemsAppend {
    pub items: Vec<OrderItemInput>,
}

/// Status change request. The label is checked with [`OrderStatus::parse`]
/// so an unknown value maps to a dedicated error code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
}

/// Edit of an existing line. `quantity == 0` or `delete` removes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemEdit {
    pub id: i64,
    pub quantity: Option<i64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub delete: bool,
}

impl OrderItemEdit {
    pub fn removes(&self) -> bool {
        self.delete || self.quantity == Some(0)
    }
}

/// Administrative order edit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderEdit {
    pub table_id: Option<i64>,
    pub staff_name: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemEdit>,
}

/// Listing filter; cancelled orders are hidden unless `cancelled=true`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub cancelled: Option<bool>,
    /// Business date `YYYY-MM-DD`
    pub date: Option<String>,
}
