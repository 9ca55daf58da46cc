//! Order service
//!
//! Every mutation takes the per-order lock, opens one transaction, applies the
//! change, recomputes the money columns and commits. Callers broadcast after
//! this returns, so listeners only ever see committed state.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Discount, DiscountCreate, DiscountKind, Order, OrderCreate, OrderDetail, OrderEdit, OrderItemInput,
    OrderStatus, OrderWithItems, Payment, PaymentCreate, PaymentReceipt,
};
use shared::util::now_millis;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::lock::OrderLocks;
use super::money::{self, OrderTotals};
use crate::db::repository::order::{NewItem, NewItemModifier, OrderFilter};
use crate::db::repository::{
    RepoError, RepoResult, discount, modifier, order, payment, product, user,
};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_amount, validate_optional_text, validate_quantity,
    validate_required_text,
};

/// Name snapshot for a line without a product
pub const FREE_LINE_NAME: &str = "Pedido libre";
/// Name snapshot for a product id that does not exist
pub const UNKNOWN_PRODUCT_NAME: &str = "Producto desconocido";

/// Result of recomputing an order's money columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recalculated {
    pub totals: OrderTotals,
    pub paid_amount: f64,
    pub is_paid: bool,
}

/// Recompute subtotal, discount total, total and the paid flag from stored rows
/// and write them back. Must run on the connection of the mutating transaction.
pub async fn recalculate_totals(
    conn: &mut SqliteConnection,
    order_id: i64,
    now: i64,
) -> RepoResult<Recalculated> {
    let lines = order::line_amounts(conn, order_id).await?;
    let discounts = discount::amounts_for_order(conn, order_id).await?;
    let payments = payment::amounts_for_order(conn, order_id).await?;

    let totals = money::calculate_totals(&lines, &discounts);
    let paid_amount = money::sum_payments(&payments);
    let is_paid = money::is_fully_paid(payments.len(), paid_amount, totals.total);

    order::write_totals(conn, order_id, &totals, is_paid, now).await?;
    Ok(Recalculated { totals, paid_amount, is_paid })
}

fn order_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
}

fn validate_items(items: &[OrderItemInput]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::OrderEmpty,
            "Order must contain at least one item",
        ));
    }
    for item in items {
        validate_quantity(item.quantity)?;
        validate_optional_text(&item.notes, "notes", MAX_NOTE_LEN)?;
    }
    Ok(())
}

fn clean_notes(notes: &Option<String>) -> Option<String> {
    notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Turn requested lines into snapshots: product name/price, modifier names/prices
async fn resolve_items(
    conn: &mut SqliteConnection,
    items: &[OrderItemInput],
) -> AppResult<Vec<NewItem>> {
    let mut resolved = Vec::with_capacity(items.len());
    for input in items {
        let (product_name, unit_price) = match input.product_id {
            Some(product_id) => product::snapshot(conn, product_id)
                .await?
                .unwrap_or_else(|| (UNKNOWN_PRODUCT_NAME.to_string(), 0.0)),
            None => (FREE_LINE_NAME.to_string(), 0.0),
        };

        let mut modifiers = Vec::with_capacity(input.modifier_ids.len());
        for &modifier_id in &input.modifier_ids {
            let found = modifier::find_active(conn, modifier_id).await?.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ModifierNotFound,
                    format!("Modifier {modifier_id} not found"),
                )
            })?;
            modifiers.push(NewItemModifier {
                modifier_id: Some(found.id),
                name: found.name,
                extra_price: found.extra_price,
            });
        }

        resolved.push(NewItem {
            product_id: input.product_id,
            product_name,
            unit_price,
            quantity: input.quantity,
            notes: clean_notes(&input.notes),
            modifiers,
        });
    }
    Ok(resolved)
}

async fn ensure_table(conn: &mut SqliteConnection, table_id: i64) -> AppResult<()> {
    let active: Option<bool> =
        sqlx::query_scalar("SELECT is_active FROM dining_tables WHERE id = ?")
            .bind(table_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(RepoError::from)?;
    match active {
        Some(true) => Ok(()),
        _ => Err(AppError::with_message(
            ErrorCode::TableNotFound,
            format!("Table {table_id} not found"),
        )),
    }
}

async fn load_with_items(conn: &mut SqliteConnection, id: i64) -> AppResult<OrderWithItems> {
    let order = order::find_by_id(conn, id)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    let items = order::find_items(conn, id).await?;
    Ok(OrderWithItems { order, items })
}

/// Order operations over the shared pool
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
    locks: OrderLocks,
}

impl OrderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: OrderLocks::new(),
        }
    }

    pub fn locks(&self) -> &OrderLocks {
        &self.locks
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await.map_err(RepoError::from)?)
    }

    async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await.map_err(RepoError::from)?)
    }

    /// Create an order with its lines. The staff name comes from `user_name`,
    /// or from the user record when only `user_id` is given.
    pub async fn create(&self, input: OrderCreate) -> AppResult<OrderWithItems> {
        validate_items(&input.items)?;
        validate_optional_text(&input.user_name, "user_name", MAX_NAME_LEN)?;

        let staff_name = match input.user_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => match input.user_id {
                Some(user_id) => user::find_by_id(&self.pool, user_id).await?.map(|u| u.name),
                None => None,
            },
        };

        let now = now_millis();
        let mut tx = self.begin().await?;
        ensure_table(&mut tx, input.table_id).await?;
        let items = resolve_items(&mut tx, &input.items).await?;

        let order_id =
            order::insert_order(&mut tx, input.table_id, input.user_id, staff_name.as_deref(), now)
                .await?;
        for item in &items {
            order::insert_item(&mut tx, order_id, item, now).await?;
        }
        recalculate_totals(&mut tx, order_id, now).await?;
        let created = load_with_items(&mut tx, order_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            table_id = input.table_id,
            items = created.items.len(),
            total = created.order.total,
            "Order created"
        );
        Ok(created)
    }

    /// Add lines to an existing order
    pub async fn append_items(&self, id: i64, items: &[OrderItemInput]) -> AppResult<OrderWithItems> {
        validate_items(items)?;
        let _guard = self.locks.lock(id).await;

        let now = now_millis();
        let mut tx = self.begin().await?;
        if order::find_by_id(&mut tx, id).await?.is_none() {
            return Err(order_not_found(id));
        }
        let resolved = resolve_items(&mut tx, items).await?;
        for item in &resolved {
            order::insert_item(&mut tx, id, item, now).await?;
        }
        recalculate_totals(&mut tx, id, now).await?;
        let updated = load_with_items(&mut tx, id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(order_id = id, added = resolved.len(), total = updated.order.total, "Items appended");
        Ok(updated)
    }

    /// Administrative edit of header fields and existing lines
    pub async fn edit(&self, id: i64, edit: OrderEdit) -> AppResult<OrderWithItems> {
        validate_optional_text(&edit.staff_name, "staff_name", MAX_NAME_LEN)?;
        for item in &edit.items {
            if let Some(quantity) = item.quantity
                && !item.removes()
            {
                validate_quantity(quantity)?;
            }
            validate_optional_text(&item.notes, "notes", MAX_NOTE_LEN)?;
        }

        let _guard = self.locks.lock(id).await;
        let now = now_millis();
        let mut tx = self.begin().await?;
        if order::find_by_id(&mut tx, id).await?.is_none() {
            return Err(order_not_found(id));
        }
        if let Some(table_id) = edit.table_id {
            ensure_table(&mut tx, table_id).await?;
        }
        let staff_name = edit
            .staff_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        order::update_header(&mut tx, id, edit.table_id, staff_name, now).await?;

        for item in &edit.items {
            let applied = if item.removes() {
                order::delete_item(&mut tx, id, item.id).await?
            } else {
                order::update_item(&mut tx, id, item.id, item.quantity, item.notes.as_deref()).await?
            };
            if !applied {
                return Err(AppError::with_message(
                    ErrorCode::OrderItemNotFound,
                    format!("Item {} not found in order {id}", item.id),
                ));
            }
        }

        recalculate_totals(&mut tx, id, now).await?;
        let updated = load_with_items(&mut tx, id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(order_id = id, item_edits = edit.items.len(), total = updated.order.total, "Order edited");
        Ok(updated)
    }

    /// Set the kitchen state. Any of the three states may follow any other.
    pub async fn set_status(&self, id: i64, status: OrderStatus) -> AppResult<Order> {
        let _guard = self.locks.lock(id).await;
        let mut conn = self.acquire().await?;
        if !order::set_status(&mut conn, id, status, now_millis()).await? {
            return Err(order_not_found(id));
        }
        let order = order::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        tracing::info!(order_id = id, status = %status, "Order status changed");
        Ok(order)
    }

    /// Set or clear the cancellation flag; the kitchen state is untouched
    pub async fn set_cancelled(&self, id: i64, cancelled: bool) -> AppResult<Order> {
        let _guard = self.locks.lock(id).await;
        let mut conn = self.acquire().await?;
        if !order::set_cancelled(&mut conn, id, cancelled, now_millis()).await? {
            return Err(order_not_found(id));
        }
        let order = order::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| order_not_found(id))?;
        tracing::info!(order_id = id, cancelled, "Order cancellation flag changed");
        Ok(order)
    }

    pub async fn get(&self, id: i64) -> AppResult<OrderWithItems> {
        let mut conn = self.acquire().await?;
        load_with_items(&mut conn, id).await
    }

    pub async fn detail(&self, id: i64) -> AppResult<OrderDetail> {
        let mut conn = self.acquire().await?;
        let OrderWithItems { order, items } = load_with_items(&mut conn, id).await?;
        let discounts = discount::find_by_order(&mut conn, id).await?;
        let payments = payment::find_by_order(&mut conn, id).await?;
        let amounts: Vec<f64> = payments.iter().map(|p| p.amount).collect();
        Ok(OrderDetail {
            order,
            items,
            discounts,
            payments,
            paid_amount: money::sum_payments(&amounts),
        })
    }

    pub async fn list(&self, filter: &OrderFilter) -> AppResult<Vec<OrderWithItems>> {
        let mut conn = self.acquire().await?;
        let orders = order::find_all(&mut conn, filter).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = order::find_items(&mut conn, order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    pub async fn discounts(&self, order_id: i64) -> AppResult<Vec<Discount>> {
        let mut conn = self.acquire().await?;
        if order::find_by_id(&mut conn, order_id).await?.is_none() {
            return Err(order_not_found(order_id));
        }
        Ok(discount::find_by_order(&mut conn, order_id).await?)
    }

    pub async fn apply_discount(
        &self,
        order_id: i64,
        input: DiscountCreate,
        operator: Option<&str>,
    ) -> AppResult<(Discount, Order)> {
        validate_amount(input.value, "value")?;
        if input.kind == DiscountKind::Percentage && input.value > 100.0 {
            return Err(AppError::validation(format!(
                "percentage must be between 0 and 100, got {}",
                input.value
            )));
        }
        validate_required_text(&input.reason, "reason", MAX_NOTE_LEN)?;
        validate_optional_text(&input.applied_by, "applied_by", MAX_NAME_LEN)?;
        let applied_by = input
            .applied_by
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or(operator);

        let _guard = self.locks.lock(order_id).await;
        let now = now_millis();
        let mut tx = self.begin().await?;
        if order::find_by_id(&mut tx, order_id).await?.is_none() {
            return Err(order_not_found(order_id));
        }
        let created = discount::insert(
            &mut tx,
            order_id,
            input.kind,
            input.value,
            input.reason.trim(),
            applied_by,
            now,
        )
        .await?;
        recalculate_totals(&mut tx, order_id, now).await?;
        let order = order::find_by_id(&mut tx, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            discount_id = created.id,
            kind = created.kind.as_str(),
            value = created.value,
            total = order.total,
            "Discount applied"
        );
        Ok((created, order))
    }

    pub async fn remove_discount(&self, discount_id: i64) -> AppResult<(Discount, Order)> {
        let existing = {
            let mut conn = self.acquire().await?;
            discount::find_by_id(&mut conn, discount_id).await?
        };
        let existing = existing.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::DiscountNotFound,
                format!("Discount {discount_id} not found"),
            )
        })?;
        let order_id = existing.order_id;

        let _guard = self.locks.lock(order_id).await;
        let now = now_millis();
        let mut tx = self.begin().await?;
        if !discount::delete(&mut tx, discount_id).await? {
            return Err(AppError::with_message(
                ErrorCode::DiscountNotFound,
                format!("Discount {discount_id} not found"),
            ));
        }
        recalculate_totals(&mut tx, order_id, now).await?;
        let order = order::find_by_id(&mut tx, order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(order_id, discount_id, total = order.total, "Discount removed");
        Ok((existing, order))
    }

    pub async fn payments(&self, order_id: i64) -> AppResult<Vec<Payment>> {
        let mut conn = self.acquire().await?;
        if order::find_by_id(&mut conn, order_id).await?.is_none() {
            return Err(order_not_found(order_id));
        }
        Ok(payment::find_by_order(&mut conn, order_id).await?)
    }

    /// Record a payment and re-evaluate the paid flag
    pub async fn add_payment(&self, order_id: i64, input: PaymentCreate) -> AppResult<PaymentReceipt> {
        validate_amount(input.amount, "amount")
            .map_err(|e| AppError::with_message(ErrorCode::PaymentInvalidAmount, e.message))?;

        let _guard = self.locks.lock(order_id).await;
        let now = now_millis();
        let mut tx = self.begin().await?;
        if order::find_by_id(&mut tx, order_id).await?.is_none() {
            return Err(order_not_found(order_id));
        }
        let created = payment::insert(&mut tx, order_id, input.method, input.amount, now).await?;
        let recalculated = recalculate_totals(&mut tx, order_id, now).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            payment_id = created.id,
            method = created.method.as_str(),
            amount = created.amount,
            paid = recalculated.paid_amount,
            is_paid = recalculated.is_paid,
            "Payment recorded"
        );
        Ok(PaymentReceipt {
            payment: created,
            paid_amount: recalculated.paid_amount,
            total: recalculated.totals.total,
            is_paid: recalculated.is_paid,
        })
    }

    /// Remove every order and kitchen note
    pub async fn reset(&self) -> AppResult<u64> {
        let removed = order::reset_all(&self.pool).await?;
        tracing::warn!(removed, "All orders and notes cleared");
        Ok(removed)
    }
}
