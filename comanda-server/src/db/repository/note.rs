//! Kitchen Note Repository

use super::{RepoError, RepoResult};
use shared::models::Note;
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Most recent notes shown on the kitchen board
pub const BOARD_LIMIT: i64 = 50;

pub async fn find_recent(pool: &SqlitePool) -> RepoResult<Vec<Note>> {
    let notes = sqlx::query_as::<_, Note>(
        "SELECT id, content, is_active, created_at FROM notes WHERE is_active = 1 ORDER BY id DESC LIMIT ?",
    )
    .bind(BOARD_LIMIT)
    .fetch_all(pool)
    .await?;
    Ok(notes)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        "SELECT id, content, is_active, created_at FROM notes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(note)
}

pub async fn create(pool: &SqlitePool, content: &str) -> RepoResult<Note> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO notes (content, created_at) VALUES (?, ?) RETURNING id",
    )
    .bind(content)
    .bind(now_millis())
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create note".into()))
}

/// Soft delete. `false` when the note is missing or already hidden.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE notes SET is_active = 0 WHERE id = ? AND is_active = 1")
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
    async fn newest_first_and_capped() {
        let pool = test_pool().await;
        for i in 0..(BOARD_LIMIT + 5) {
            create(&pool, &format!("nota {i}")).await.unwrap();
        }
        let notes = find_recent(&pool).await.unwrap();
        assert_eq!(notes.len() as i64, BOARD_LIMIT);
        assert_eq!(notes[0].content, format!("nota {}", BOARD_LIMIT + 4));
        assert!(notes.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn deleted_notes_leave_the_board() {
        let pool = test_pool().await;
        let a = create(&pool, "sin gluten mesa 4").await.unwrap();
        let b = create(&pool, "falta pan").await.unwrap();
        assert!(delete(&pool, a.id).await.unwrap());
        assert!(!delete(&pool, a.id).await.unwrap());
        assert!(!delete(&pool, 999).await.unwrap());

        let notes = find_recent(&pool).await.unwrap();
        assert_eq!(notes, vec![b]);
    }
}
