//! Audit log model

use serde::{Deserialize, Serialize};

/// One persisted audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    /// JSON text
    pub details: Option<String>,
    pub ip: Option<String>,
    pub created_at: i64,
}

fn default_limit() -> i64 {
    50
}

/// Audit listing filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditQuery {
    pub entity: Option<String>,
    pub action: Option<String>,
    /// Inclusive lower bound, Unix millis
    pub from: Option<i64>,
    /// Exclusive upper bound, Unix millis
    pub to: Option<i64>,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            entity: None,
            action: None,
            from: None,
            to: None,
            offset: 0,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
}
