//! Daily report models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TableStat {
    pub table_id: i64,
    pub table_name: Option<String>,
    pub total: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StaffStat {
    pub staff_name: String,
    pub total: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductStat {
    pub product_name: String,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Aggregates for one business day. Cancelled orders are excluded from
/// revenue and breakdowns and reported separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStats {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_revenue: f64,
    pub order_count: i64,
    pub cancelled_count: i64,
    pub by_table: Vec<TableStat>,
    pub by_staff: Vec<StaffStat>,
    pub top_products: Vec<ProductStat>,
    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    /// `YYYY-MM-DD`; defaults to today in the business timezone
    pub date: Option<String>,
}
