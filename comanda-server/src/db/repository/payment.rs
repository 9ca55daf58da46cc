//! Payment Repository

use super::RepoResult;
use shared::models::{Payment, PaymentMethod};
use sqlx::SqliteConnection;

pub async fn insert(
    conn: &mut SqliteConnection,
    order_id: i64,
    method: PaymentMethod,
    amount: f64,
    now: i64,
) -> RepoResult<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (order_id, method, amount, created_at) VALUES (?, ?, ?, ?) \
         RETURNING id, order_id, method, amount, created_at",
    )
    .bind(order_id)
    .bind(method)
    .bind(amount)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(payment)
}

pub async fn find_by_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        "SELECT id, order_id, method, amount, created_at FROM payments WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(payments)
}

/// Raw amounts of every payment on the order
pub async fn amounts_for_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<f64>> {
    let amounts: Vec<f64> =
        sqlx::query_scalar("SELECT amount FROM payments WHERE order_id = ? ORDER BY id")
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(amounts)
}
