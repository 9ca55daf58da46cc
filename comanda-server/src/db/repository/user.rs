//! User Repository
//!
//! Staff accounts. PIN hashing happens in `auth::pin`; this module only stores hashes.

use super::{RepoError, RepoResult};
use shared::models::{User, UserRole};
use shared::util::now_millis;
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool, role: Option<UserRole>) -> RepoResult<Vec<User>> {
    let users = match role {
        Some(role) => {
            sqlx::query_as::<_, User>(
                "SELECT id, name, role, pin_hash, is_active, created_at, updated_at FROM users \
                 WHERE is_active = 1 AND role = ? ORDER BY name",
            )
            .bind(role)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>(
                "SELECT id, name, role, pin_hash, is_active, created_at, updated_at FROM users \
                 WHERE is_active = 1 ORDER BY name",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, role, pin_hash, is_active, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_active_admins(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    find_all(pool, Some(UserRole::Admin)).await
}

pub async fn count_active_admins(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1 AND role = 'admin'")
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    role: UserRole,
    pin_hash: &str,
) -> RepoResult<User> {
    let now = now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, role, pin_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(role)
    .bind(pin_hash)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Column changes for [`update`]; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub pin_hash: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update(pool: &SqlitePool, id: i64, changes: UserChanges) -> RepoResult<User> {
    let rows = sqlx::query(
        "UPDATE users SET name = COALESCE(?1, name), role = COALESCE(?2, role), \
         pin_hash = COALESCE(?3, pin_hash), is_active = COALESCE(?4, is_active), updated_at = ?5 \
         WHERE id = ?6",
    )
    .bind(changes.name)
    .bind(changes.role)
    .bind(changes.pin_hash)
    .bind(changes.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE users SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
