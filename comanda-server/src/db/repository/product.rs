//! Product Repository

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.price, p.category_id, c.name AS category_name, \
     p.is_active, p.created_at, p.updated_at \
     FROM products p LEFT JOIN categories c ON c.id = p.category_id";

/// Active products ordered by name, optionally within one category
pub async fn find_all(pool: &SqlitePool, category_id: Option<i64>) -> RepoResult<Vec<Product>> {
    let products = match category_id {
        Some(category_id) => {
            sqlx::query_as::<_, Product>(&format!(
                "{PRODUCT_SELECT} WHERE p.is_active = 1 AND p.category_id = ? ORDER BY p.name"
            ))
            .bind(category_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Product>(&format!(
                "{PRODUCT_SELECT} WHERE p.is_active = 1 ORDER BY p.name"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(products)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

/// Name and price for an order line snapshot, regardless of `is_active`
pub async fn snapshot(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<(String, f64)>> {
    let row: Option<(String, f64)> =
        sqlx::query_as("SELECT name, price FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products (name, price, category_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.price)
    .bind(data.category_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let rows = sqlx::query(
        "UPDATE products SET name = COALESCE(?1, name), price = COALESCE(?2, price), \
         category_id = COALESCE(?3, category_id), is_active = COALESCE(?4, is_active), updated_at = ?5 \
         WHERE id = ?6",
    )
    .bind(&data.name)
    .bind(data.price)
    .bind(data.category_id)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Soft delete; existing order lines keep their snapshot
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
