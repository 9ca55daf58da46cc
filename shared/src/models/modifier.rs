//! Modifier Model

use serde::{Deserialize, Serialize};

/// Priced customization that can be attached to an order item ("Extra queso")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Modifier {
    pub id: i64,
    pub name: String,
    pub extra_price: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierCreate {
    pub name: String,
    #[serde(default)]
    pub extra_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifierUpdate {
    pub name: Option<String>,
    pub extra_price: Option<f64>,
    pub is_active: Option<bool>,
}
