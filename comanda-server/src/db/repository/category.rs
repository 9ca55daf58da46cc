//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use shared::util::now_millis;
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, sort_order, created_at, updated_at FROM categories ORDER BY sort_order, name",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, sort_order, created_at, updated_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    let now = now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> RepoResult<Category> {
    let rows = sqlx::query(
        "UPDATE categories SET name = COALESCE(?1, name), sort_order = COALESCE(?2, sort_order), updated_at = ?3 WHERE id = ?4",
    )
    .bind(&data.name)
    .bind(data.sort_order)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
}

/// Hard delete. Products in the category become uncategorized.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    async fn test_pool() -> SqlitePool {
        DbService::open_in_memory().await.unwrap().pool
    }

    fn new_category(name: &str, sort_order: Option<i64>) -> CategoryCreate {
        CategoryCreate { name: name.into(), sort_order }
    }

    #[tokio::test]
    async fn listing_is_ordered_by_sort_then_name() {
        let pool = test_pool().await;
        create(&pool, new_category("Postres", Some(3))).await.unwrap();
        create(&pool, new_category("Bebidas", Some(1))).await.unwrap();
        create(&pool, new_category("Entradas", Some(1))).await.unwrap();

        let names: Vec<String> = find_all(&pool).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bebidas", "Entradas", "Postres"]);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let pool = test_pool().await;
        create(&pool, new_category("Pizzas", None)).await.unwrap();
        let err = create(&pool, new_category("Pizzas", None)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let pool = test_pool().await;
        let cat = create(&pool, new_category("Minutas", None)).await.unwrap();
        let updated = update(
            &pool,
            cat.id,
            CategoryUpdate { name: None, sort_order: Some(7) },
        )
        .await
        .unwrap();
        assert_eq!(updated.sort_order, 7);
        assert_eq!(updated.name, "Minutas");

        assert!(delete(&pool, cat.id).await.unwrap());
        assert!(find_by_id(&pool, cat.id).await.unwrap().is_none());
        assert!(!delete(&pool, cat.id).await.unwrap());
    }
}
