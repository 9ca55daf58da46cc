//! Report Repository
//!
//! Aggregates over a `[start, end)` window of order creation times (Unix millis).
//! Cancelled orders never count towards revenue.

use super::RepoResult;
use shared::models::{ProductStat, StaffStat, StatusCount, TableStat};
use sqlx::SqlitePool;

/// How many products the daily report ranks
pub const TOP_PRODUCTS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTotals {
    pub revenue: f64,
    pub orders: i64,
    pub cancelled: i64,
}

/// One line of the orders CSV export
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderExportRow {
    pub id: i64,
    pub created_at: i64,
    pub table_name: Option<String>,
    pub staff_name: Option<String>,
    pub total: f64,
    pub is_cancelled: bool,
}

pub async fn day_totals(pool: &SqlitePool, start: i64, end: i64) -> RepoResult<DayTotals> {
    let (revenue, orders, cancelled): (f64, i64, i64) = sqlx::query_as(
        "SELECT \
            TOTAL(CASE WHEN is_cancelled = 0 THEN total ELSE 0 END), \
            COALESCE(SUM(CASE WHEN is_cancelled = 0 THEN 1 ELSE 0 END), 0), \
            COALESCE(SUM(CASE WHEN is_cancelled = 1 THEN 1 ELSE 0 END), 0) \
         FROM orders WHERE created_at >= ? AND created_at < ?",
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(DayTotals { revenue, orders, cancelled })
}

pub async fn by_table(pool: &SqlitePool, start: i64, end: i64) -> RepoResult<Vec<TableStat>> {
    let rows = sqlx::query_as::<_, TableStat>(
        "SELECT o.table_id, t.name AS table_name, TOTAL(o.total) AS total, COUNT(*) AS orders \
         FROM orders o LEFT JOIN dining_tables t ON t.id = o.table_id \
         WHERE o.is_cancelled = 0 AND o.created_at >= ? AND o.created_at < ? \
         GROUP BY o.table_id ORDER BY total DESC, o.table_id",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Orders without a staff name are left out
pub async fn by_staff(pool: &SqlitePool, start: i64, end: i64) -> RepoResult<Vec<StaffStat>> {
    let rows = sqlx::query_as::<_, StaffStat>(
        "SELECT staff_name, TOTAL(total) AS total, COUNT(*) AS orders FROM orders \
         WHERE is_cancelled = 0 AND staff_name IS NOT NULL AND created_at >= ? AND created_at < ? \
         GROUP BY staff_name ORDER BY total DESC, staff_name",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn top_products(pool: &SqlitePool, start: i64, end: i64) -> RepoResult<Vec<ProductStat>> {
    let rows = sqlx::query_as::<_, ProductStat>(
        "SELECT i.product_name, SUM(i.quantity) AS quantity, \
            TOTAL(i.unit_price * i.quantity) AS revenue \
         FROM order_items i JOIN orders o ON o.id = i.order_id \
         WHERE o.is_cancelled = 0 AND o.created_at >= ? AND o.created_at < ? \
         GROUP BY i.product_name ORDER BY quantity DESC, i.product_name LIMIT ?",
    )
    .bind(start)
    .bind(end)
    .bind(TOP_PRODUCTS)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn by_status(pool: &SqlitePool, start: i64, end: i64) -> RepoResult<Vec<StatusCount>> {
    let rows = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM orders \
         WHERE is_cancelled = 0 AND created_at >= ? AND created_at < ? \
         GROUP BY status ORDER BY status",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every order of the window, cancelled included, by id
pub async fn export_rows(pool: &SqlitePool, start: i64, end: i64) -> RepoResult<Vec<OrderExportRow>> {
    let rows = sqlx::query_as::<_, OrderExportRow>(
        "SELECT o.id, o.created_at, t.name AS table_name, o.staff_name, o.total, o.is_cancelled \
         FROM orders o LEFT JOIN dining_tables t ON t.id = o.table_id \
         WHERE o.created_at >= ? AND o.created_at < ? ORDER BY o.id",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
