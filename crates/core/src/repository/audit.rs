//! Append-only audit trail for successful mutations.
//!
//! Recording is deliberately non-fatal: a request that already changed the
//! store must not fail because the trail could not be written. Failures are
//! logged and swallowed.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::warn;

use crate::error::RecordResult;
use crate::model::{AuditAction, LogEntry, ResourceKind};

#[derive(Clone)]
pub struct AuditLog {
    pool: SqlitePool,
}

impl AuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one entry. Never fails the caller; a write error is reduced to
    /// a warning.
    pub async fn record(&self, action: AuditAction, resource: ResourceKind, resource_id: &str) {
        if let Err(err) = self.try_record(action, resource, resource_id).await {
            warn!(
                action = action.as_str(),
                resource = resource.as_str(),
                resource_id,
                error = %err,
                "failed to append audit entry"
            );
        }
    }

    async fn try_record(
        &self,
        action: AuditAction,
        resource: ResourceKind,
        resource_id: &str,
    ) -> RecordResult<()> {
        sqlx::query(
            "INSERT INTO logs (timestamp, action, resource, resource_id) VALUES (?, ?, ?, ?)",
        )
        .bind(Utc::now())
        .bind(action)
        .bind(resource)
        .bind(resource_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent entries, newest first. Entries sharing a timestamp
    /// fall back to insertion order, still newest first.
    pub async fn recent(&self, limit: u32) -> RecordResult<Vec<LogEntry>> {
        let rows = sqlx::query_as::<_, LogEntry>(
            "SELECT * FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn records_come_back_newest_first() {
        let audit = AuditLog::new(test_pool().await);

        audit
            .record(AuditAction::Create, ResourceKind::Patient, "p1")
            .await;
        audit
            .record(AuditAction::Patch, ResourceKind::Patient, "p1")
            .await;
        audit
            .record(AuditAction::Create, ResourceKind::Observation, "o1")
            .await;

        let entries = audit.recent(100).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].resource_id, "o1");
        assert_eq!(entries[0].resource, ResourceKind::Observation);
        assert_eq!(entries[2].action, AuditAction::Create);
        assert_eq!(entries[2].resource_id, "p1");
        assert!(entries[0].id > entries[2].id);
    }

    #[tokio::test]
    async fn limit_is_honoured() {
        let audit = AuditLog::new(test_pool().await);
        for i in 0..5 {
            audit
                .record(
                    AuditAction::Create,
                    ResourceKind::Patient,
                    &format!("p{i}"),
                )
                .await;
        }

        let entries = audit.recent(2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].resource_id, "p4");
        assert_eq!(entries[1].resource_id, "p3");
    }

    #[tokio::test]
    async fn recording_failure_is_swallowed() {
        let pool = test_pool().await;
        sqlx::query("DROP TABLE logs").execute(&pool).await.unwrap();

        let audit = AuditLog::new(pool);
        audit
            .record(AuditAction::Delete, ResourceKind::Patient, "p1")
            .await;
    }
}
