//! Discount Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum DiscountKind {
    /// Percentage of the subtotal
    #[serde(rename = "porcentaje", alias = "percentage")]
    #[cfg_attr(feature = "db", sqlx(rename = "porcentaje"))]
    Percentage,
    /// Fixed amount
    #[serde(rename = "monto", alias = "fixed")]
    #[cfg_attr(feature = "db", sqlx(rename = "monto"))]
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "porcentaje",
            DiscountKind::Fixed => "monto",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Discount {
    pub id: i64,
    pub order_id: i64,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: f64,
    pub reason: String,
    pub applied_by: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCreate {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: f64,
    pub reason: String,
    /// Defaults to the authenticated user's name
    pub applied_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_create_accepts_type_field() {
        let input: DiscountCreate =
            serde_json::from_str(r#"{"type":"percentage","value":10,"reason":"cumple"}"#)
                .unwrap();
        assert_eq!(input.kind, DiscountKind::Percentage);

        let input: DiscountCreate =
            serde_json::from_str(r#"{"type":"monto","value":150,"reason":"cortesia"}"#).unwrap();
        assert_eq!(input.kind, DiscountKind::Fixed);

        assert!(
            serde_json::from_str::<DiscountCreate>(r#"{"type":"bogo","value":1,"reason":"x"}"#)
                .is_err()
        );
    }
}
