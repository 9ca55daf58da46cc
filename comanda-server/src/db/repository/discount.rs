//! Discount Repository

use super::RepoResult;
use crate::orders::money::DiscountAmount;
use shared::models::{Discount, DiscountKind};
use sqlx::SqliteConnection;

pub async fn insert(
    conn: &mut SqliteConnection,
    order_id: i64,
    kind: DiscountKind,
    value: f64,
    reason: &str,
    applied_by: Option<&str>,
    now: i64,
) -> RepoResult<Discount> {
    let discount = sqlx::query_as::<_, Discount>(
        "INSERT INTO discounts (order_id, kind, value, reason, applied_by, created_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         RETURNING id, order_id, kind, value, reason, applied_by, created_at",
    )
    .bind(order_id)
    .bind(kind)
    .bind(value)
    .bind(reason)
    .bind(applied_by)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(discount)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Discount>> {
    let discount = sqlx::query_as::<_, Discount>(
        "SELECT id, order_id, kind, value, reason, applied_by, created_at FROM discounts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(discount)
}

pub async fn find_by_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<Discount>> {
    let discounts = sqlx::query_as::<_, Discount>(
        "SELECT id, order_id, kind, value, reason, applied_by, created_at FROM discounts \
         WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(discounts)
}

pub async fn amounts_for_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<DiscountAmount>> {
    let rows: Vec<(DiscountKind, f64)> =
        sqlx::query_as("SELECT kind, value FROM discounts WHERE order_id = ? ORDER BY id")
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(kind, value)| DiscountAmount { kind, value })
        .collect())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM discounts WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}
