//! Audit Log Repository

use super::RepoResult;
use shared::models::{AuditEntry, AuditQuery};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub const MAX_PAGE: i64 = 500;

/// Row to append; `details` is JSON text
#[derive(Debug, Clone, Default)]
pub struct NewAuditEntry {
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
    pub ip: Option<String>,
    pub created_at: i64,
}

pub async fn insert(pool: &SqlitePool, entry: &NewAuditEntry) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO audit_log (user_id, user_name, action, entity, entity_id, details, ip, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(entry.user_id)
    .bind(&entry.user_name)
    .bind(&entry.action)
    .bind(&entry.entity)
    .bind(entry.entity_id)
    .bind(&entry.details)
    .bind(&entry.ip)
    .bind(entry.created_at)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, query: &'a AuditQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(entity) = &query.entity {
        qb.push(" AND entity = ").push_bind(entity);
    }
    if let Some(action) = &query.action {
        qb.push(" AND action = ").push_bind(action);
    }
    if let Some(from) = query.from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

/// Newest first page plus the total number of matching rows
pub async fn query(pool: &SqlitePool, query: &AuditQuery) -> RepoResult<(Vec<AuditEntry>, i64)> {
    let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM audit_log");
    push_filters(&mut count_qb, query);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, user_id, user_name, action, entity, entity_id, details, ip, created_at FROM audit_log",
    );
    push_filters(&mut qb, query);
    qb.push(" ORDER BY id DESC LIMIT ")
        .push_bind(query.limit.clamp(1, MAX_PAGE))
        .push(" OFFSET ")
        .push_bind(query.offset.max(0));
    let items = qb.build_query_as::<AuditEntry>().fetch_all(pool).await?;

    Ok((items, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn entry(action: &str, entity: &str, at: i64) -> NewAuditEntry {
        NewAuditEntry {
            action: action.into(),
            entity: entity.into(),
            entity_id: Some(1),
            created_at: at,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn filters_and_paginates() {
        let pool = DbService::open_in_memory().await.unwrap().pool;
        insert(&pool, &entry("create", "order", 10)).await.unwrap();
        insert(&pool, &entry("cancel", "order", 20)).await.unwrap();
        insert(&pool, &entry("create", "product", 30)).await.unwrap();
        insert(&pool, &entry("create", "order", 40)).await.unwrap();

        let (items, total) = query(&pool, &AuditQuery::default()).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(items[0].created_at, 40);

        let orders_only = AuditQuery { entity: Some("order".into()), ..Default::default() };
        let (items, total) = query(&pool, &orders_only).await.unwrap();
        assert_eq!(total, 3);
        assert!(items.iter().all(|e| e.entity == "order"));

        let page = AuditQuery { offset: 1, limit: 2, ..Default::default() };
        let (items, total) = query(&pool, &page).await.unwrap();
        assert_eq!(total, 4);
        let times: Vec<i64> = items.iter().map(|e| e.created_at).collect();
        assert_eq!(times, vec![30, 20]);

        let window = AuditQuery {
            action: Some("create".into()),
            from: Some(15),
            to: Some(35),
            ..Default::default()
        };
        let (items, total) = query(&pool, &window).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].entity, "product");
    }
}
