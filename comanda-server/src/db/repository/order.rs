//! Order Repository
//!
//! Order rows, item rows and item modifier rows. Every function takes a
//! connection so the order service can run a whole mutation in one transaction.

use std::collections::HashMap;

use super::RepoResult;
use crate::orders::money::{LineAmounts, OrderTotals};
use shared::models::{Order, OrderItem, OrderItemDetail, OrderItemModifier, OrderStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT o.id, o.table_id, t.name AS table_name, o.user_id, o.staff_name, \
     o.status, o.subtotal, o.discount_total, o.total, o.is_cancelled, o.is_paid, o.created_at, o.updated_at \
     FROM orders o LEFT JOIN dining_tables t ON t.id = o.table_id";

/// Snapshot of one modifier attached to a new line
#[derive(Debug, Clone)]
pub struct NewItemModifier {
    pub modifier_id: Option<i64>,
    pub name: String,
    pub extra_price: f64,
}

/// Fully resolved line ready to be written
#[derive(Debug, Clone)]
pub struct NewItem {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub notes: Option<String>,
    pub modifiers: Vec<NewItemModifier>,
}

/// Listing filter. `range` is a `[start, end)` window in Unix millis.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub cancelled: bool,
    pub range: Option<(i64, i64)>,
}

pub async fn insert_order(
    conn: &mut SqliteConnection,
    table_id: i64,
    user_id: Option<i64>,
    staff_name: Option<&str>,
    now: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (table_id, user_id, staff_name, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(table_id)
    .bind(user_id)
    .bind(staff_name)
    .bind(OrderStatus::Pending)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Insert one line and its modifier snapshots
pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item: &NewItem,
    now: i64,
) -> RepoResult<i64> {
    let item_id: i64 = sqlx::query_scalar(
        "INSERT INTO order_items (order_id, product_id, product_name, unit_price, quantity, notes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.unit_price)
    .bind(item.quantity)
    .bind(&item.notes)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    for modifier in &item.modifiers {
        sqlx::query(
            "INSERT INTO order_item_modifiers (order_item_id, modifier_id, modifier_name, extra_price) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(item_id)
        .bind(modifier.modifier_id)
        .bind(&modifier.name)
        .bind(modifier.extra_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(item_id)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("{ORDER_SELECT} WHERE o.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(order)
}

/// Orders matching the filter, newest first
pub async fn find_all(conn: &mut SqliteConnection, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(ORDER_SELECT);
    qb.push(" WHERE o.is_cancelled = ").push_bind(filter.cancelled);
    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some((start, end)) = filter.range {
        qb.push(" AND o.created_at >= ")
            .push_bind(start)
            .push(" AND o.created_at < ")
            .push_bind(end);
    }
    qb.push(" ORDER BY o.created_at DESC, o.id DESC");

    let orders = qb.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    Ok(orders)
}

/// Lines of one order, oldest first, each with its modifiers
pub async fn find_items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItemDetail>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, product_name, unit_price, quantity, notes, created_at \
         FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let modifiers = sqlx::query_as::<_, OrderItemModifier>(
        "SELECT m.id, m.order_item_id, m.modifier_id, m.modifier_name, m.extra_price \
         FROM order_item_modifiers m JOIN order_items i ON i.id = m.order_item_id \
         WHERE i.order_id = ? ORDER BY m.id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_item: HashMap<i64, Vec<OrderItemModifier>> = HashMap::new();
    for modifier in modifiers {
        by_item.entry(modifier.order_item_id).or_default().push(modifier);
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let modifiers = by_item.remove(&item.id).unwrap_or_default();
            OrderItemDetail { item, modifiers }
        })
        .collect())
}

/// Price inputs for the totals calculation
pub async fn line_amounts(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<LineAmounts>> {
    let items: Vec<(i64, f64, i64)> = sqlx::query_as(
        "SELECT id, unit_price, quantity FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let extras: Vec<(i64, f64)> = sqlx::query_as(
        "SELECT m.order_item_id, m.extra_price FROM order_item_modifiers m \
         JOIN order_items i ON i.id = m.order_item_id WHERE i.order_id = ?",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_item: HashMap<i64, Vec<f64>> = HashMap::new();
    for (item_id, price) in extras {
        by_item.entry(item_id).or_default().push(price);
    }

    Ok(items
        .into_iter()
        .map(|(id, unit_price, quantity)| LineAmounts {
            unit_price,
            quantity,
            modifier_prices: by_item.remove(&id).unwrap_or_default(),
        })
        .collect())
}

pub async fn count_items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = ?")
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Change quantity and/or notes of a line. Returns false when the line is not in the order.
pub async fn update_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item_id: i64,
    quantity: Option<i64>,
    notes: Option<&str>,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE order_items SET quantity = COALESCE(?1, quantity), notes = COALESCE(?2, notes) \
         WHERE id = ?3 AND order_id = ?4",
    )
    .bind(quantity)
    .bind(notes)
    .bind(item_id)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn delete_item(conn: &mut SqliteConnection, order_id: i64, item_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM order_items WHERE id = ? AND order_id = ?")
        .bind(item_id)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn update_header(
    conn: &mut SqliteConnection,
    id: i64,
    table_id: Option<i64>,
    staff_name: Option<&str>,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET table_id = COALESCE(?1, table_id), staff_name = COALESCE(?2, staff_name), \
         updated_at = ?3 WHERE id = ?4",
    )
    .bind(table_id)
    .bind(staff_name)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn set_cancelled(
    conn: &mut SqliteConnection,
    id: i64,
    cancelled: bool,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE orders SET is_cancelled = ?, updated_at = ? WHERE id = ?")
        .bind(cancelled)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Persist derived money columns
pub async fn write_totals(
    conn: &mut SqliteConnection,
    id: i64,
    totals: &OrderTotals,
    is_paid: bool,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE orders SET subtotal = ?, discount_total = ?, total = ?, is_paid = ?, updated_at = ? WHERE id = ?",
    )
    .bind(totals.subtotal)
    .bind(totals.discount_total)
    .bind(totals.total)
    .bind(is_paid)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Wipe all orders (cascading to items, discounts and payments) and kitchen notes.
/// Returns the number of orders removed.
pub async fn reset_all(pool: &SqlitePool) -> RepoResult<u64> {
    let mut tx = pool.begin().await?;
    let removed = sqlx::query("DELETE FROM orders").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM notes").execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(removed.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn test_pool() -> SqlitePool {
        DbService::open_in_memory().await.unwrap().pool
    }

    fn line(name: &str, price: f64, quantity: i64, modifiers: Vec<NewItemModifier>) -> NewItem {
        NewItem {
            product_id: None,
            product_name: name.into(),
            unit_price: price,
            quantity,
            notes: None,
            modifiers,
        }
    }

    #[tokio::test]
    async fn insert_and_read_back_with_modifiers() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query("INSERT INTO dining_tables (name, created_at, updated_at) VALUES ('Mesa 3', 0, 0)")
            .execute(&mut *conn)
            .await
            .unwrap();

        let id = insert_order(&mut conn, 1, None, Some("Ana"), 1_000).await.unwrap();
        let extra = NewItemModifier { modifier_id: None, name: "Extra queso".into(), extra_price: 1.0 };
        insert_item(&mut conn, id, &line("Pizza", 10.0, 2, vec![extra]), 1_000).await.unwrap();
        insert_item(&mut conn, id, &line("Agua", 3.0, 1, vec![]), 1_000).await.unwrap();

        let order = find_by_id(&mut conn, id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.table_name.as_deref(), Some("Mesa 3"));
        assert_eq!(order.staff_name.as_deref(), Some("Ana"));

        let items = find_items(&mut conn, id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].modifiers.len(), 1);
        assert_eq!(items[0].modifiers[0].modifier_name, "Extra queso");
        assert!(items[1].modifiers.is_empty());

        let amounts = line_amounts(&mut conn, id).await.unwrap();
        assert_eq!(amounts[0].modifier_prices, vec![1.0]);
        assert_eq!(amounts[1].quantity, 1);
    }

    #[tokio::test]
    async fn filter_hides_cancelled_and_respects_range() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let a = insert_order(&mut conn, 1, None, None, 100).await.unwrap();
        let b = insert_order(&mut conn, 2, None, None, 200).await.unwrap();
        let c = insert_order(&mut conn, 3, None, None, 300).await.unwrap();
        set_cancelled(&mut conn, b, true, 250).await.unwrap();
        set_status(&mut conn, c, OrderStatus::Ready, 310).await.unwrap();

        let visible = find_all(&mut conn, &OrderFilter::default()).await.unwrap();
        let ids: Vec<i64> = visible.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![c, a]);

        let cancelled = find_all(&mut conn, &OrderFilter { cancelled: true, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, b);

        let ready = find_all(
            &mut conn,
            &OrderFilter { status: Some(OrderStatus::Ready), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(ready.len(), 1);

        let early = find_all(&mut conn, &OrderFilter { range: Some((0, 150)), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(early.len(), 1);
        assert_eq!(early[0].id, a);
    }

    #[tokio::test]
    async fn item_edits_are_scoped_to_the_order() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let first = insert_order(&mut conn, 1, None, None, 0).await.unwrap();
        let second = insert_order(&mut conn, 1, None, None, 0).await.unwrap();
        let item = insert_item(&mut conn, first, &line("Cafe", 2.0, 1, vec![]), 0).await.unwrap();

        assert!(!update_item(&mut conn, second, item, Some(3), None).await.unwrap());
        assert!(update_item(&mut conn, first, item, Some(3), Some("cortado")).await.unwrap());
        let items = find_items(&mut conn, first).await.unwrap();
        assert_eq!(items[0].item.quantity, 3);
        assert_eq!(items[0].item.notes.as_deref(), Some("cortado"));

        assert!(!delete_item(&mut conn, second, item).await.unwrap());
        assert!(delete_item(&mut conn, first, item).await.unwrap());
        assert_eq!(count_items(&mut conn, first).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_removes_orders_and_notes() {
        let pool = test_pool().await;
        {
            let mut conn = pool.acquire().await.unwrap();
            let id = insert_order(&mut conn, 1, None, None, 0).await.unwrap();
            insert_item(&mut conn, id, &line("Te", 1.0, 1, vec![]), 0).await.unwrap();
            sqlx::query("INSERT INTO notes (content, created_at) VALUES ('x', 0)")
                .execute(&mut *conn)
                .await
                .unwrap();
        }
        assert_eq!(reset_all(&pool).await.unwrap(), 1);

        let mut conn = pool.acquire().await.unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(items, 0);
        let notes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(notes, 0);
    }
}
