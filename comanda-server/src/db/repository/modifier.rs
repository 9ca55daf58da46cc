//! Modifier Repository

use super::{RepoError, RepoResult};
use shared::models::{Modifier, ModifierCreate, ModifierUpdate};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Modifier>> {
    let modifiers = sqlx::query_as::<_, Modifier>(
        "SELECT id, name, extra_price, is_active, created_at, updated_at FROM modifiers WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(modifiers)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Modifier>> {
    let modifier = sqlx::query_as::<_, Modifier>(
        "SELECT id, name, extra_price, is_active, created_at, updated_at FROM modifiers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(modifier)
}

/// Active modifier lookup inside an order transaction
pub async fn find_active(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Modifier>> {
    let modifier = sqlx::query_as::<_, Modifier>(
        "SELECT id, name, extra_price, is_active, created_at, updated_at FROM modifiers WHERE id = ? AND is_active = 1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(modifier)
}

pub async fn create(pool: &SqlitePool, data: ModifierCreate) -> RepoResult<Modifier> {
    let now = now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO modifiers (name, extra_price, created_at, updated_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.extra_price)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create modifier".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ModifierUpdate) -> RepoResult<Modifier> {
    let rows = sqlx::query(
        "UPDATE modifiers SET name = COALESCE(?1, name), extra_price = COALESCE(?2, extra_price), \
         is_active = COALESCE(?3, is_active), updated_at = ?4 WHERE id = ?5",
    )
    .bind(&data.name)
    .bind(data.extra_price)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Modifier {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Modifier {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE modifiers SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now_millis())
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

    #[tokio::test]
    async fn default_modifiers_are_seeded() {
        let pool = test_pool().await;
        let seeded = find_all(&pool).await.unwrap();
        assert_eq!(seeded.len(), 8);
        assert!(seeded.iter().all(|m| m.is_active));
    }

    #[tokio::test]
    async fn soft_deleted_modifier_is_hidden() {
        let pool = test_pool().await;
        let m = create(&pool, ModifierCreate { name: "Doble cheddar".into(), extra_price: 1.5 })
            .await
            .unwrap();
        assert_eq!(m.extra_price, 1.5);
        assert_eq!(find_all(&pool).await.unwrap().len(), 9);

        assert!(delete(&pool, m.id).await.unwrap());
        assert_eq!(find_all(&pool).await.unwrap().len(), 8);

        let mut conn = pool.acquire().await.unwrap();
        assert!(find_active(&mut conn, m.id).await.unwrap().is_none());
        drop(conn);
        assert!(find_by_id(&pool, m.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_reactivates() {
        let pool = test_pool().await;
        let m = create(&pool, ModifierCreate { name: "Sin hielo".into(), extra_price: 0.0 })
            .await
            .unwrap();
        delete(&pool, m.id).await.unwrap();
        let m = update(
            &pool,
            m.id,
            ModifierUpdate { name: None, extra_price: Some(0.5), is_active: Some(true) },
        )
        .await
        .unwrap();
        assert!(m.is_active);
        assert_eq!(m.extra_price, 0.5);
    }
}
