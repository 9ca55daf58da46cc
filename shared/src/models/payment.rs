//! Payment Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum PaymentMethod {
    #[serde(rename = "efectivo", alias = "cash")]
    #[cfg_attr(feature = "db", sqlx(rename = "efectivo"))]
    Cash,
    #[serde(rename = "debito", alias = "debit")]
    #[cfg_attr(feature = "db", sqlx(rename = "debito"))]
    Debit,
    #[serde(rename = "credito", alias = "credit")]
    #[cfg_attr(feature = "db", sqlx(rename = "credito"))]
    Credit,
    #[serde(rename = "qr")]
    #[cfg_attr(feature = "db", sqlx(rename = "qr"))]
    Qr,
    #[serde(rename = "transferencia", alias = "transfer")]
    #[cfg_attr(feature = "db", sqlx(rename = "transferencia"))]
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Debit => "debito",
            PaymentMethod::Credit => "credito",
            PaymentMethod::Qr => "qr",
            PaymentMethod::Transfer => "transferencia",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub amount: f64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub method: PaymentMethod,
    pub amount: f64,
}

/// Result of recording a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// Sum of all payments on the order
    pub paid_amount: f64,
    pub total: f64,
    pub is_paid: bool,
}
