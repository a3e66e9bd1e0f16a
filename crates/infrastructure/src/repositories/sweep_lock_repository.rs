use async_trait::async_trait;
use chrono::Utc;
use spacesweep_application::ports::SweepLock;
use spacesweep_domain::DomainError;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, instrument};

/// Lease row in `maintenance_locks`, taken over once `expires_at` has passed.
pub struct SqliteSweepLock {
    pool: SqlitePool,
    lock_id: String,
}

impl SqliteSweepLock {
    pub fn new(pool: SqlitePool, lock_id: impl Into<String>) -> Self {
        Self {
            pool,
            lock_id: lock_id.into(),
        }
    }

    pub async fn current_holder(&self) -> Result<Option<String>, DomainError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT holder, expires_at FROM maintenance_locks WHERE id = ?")
                .bind(&self.lock_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::LockError(e.to_string()))?;

        let now = Utc::now().timestamp_millis();
        Ok(row.and_then(|(holder, expires_at)| (expires_at > now).then_some(holder)))
    }
}

#[async_trait]
impl SweepLock for SqliteSweepLock {
    #[instrument(skip(self), fields(lock_id = %self.lock_id))]
    async fn try_acquire(&self, holder: &str, ttl: Duration) -> Result<bool, DomainError> {
        let now = Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_ms);

        let result = sqlx::query(
            "INSERT INTO maintenance_locks (id, holder, started_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 holder = excluded.holder,
                 started_at = excluded.started_at,
                 expires_at = excluded.expires_at
             WHERE maintenance_locks.expires_at <= ?3",
        )
        .bind(&self.lock_id)
        .bind(holder)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to acquire sweep lock");
            DomainError::LockError(e.to_string())
        })?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(lock_id = %self.lock_id))]
    async fn release(&self, holder: &str) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM maintenance_locks WHERE id = ? AND holder = ?")
            .bind(&self.lock_id)
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to release sweep lock");
                DomainError::LockError(e.to_string())
            })?;
        Ok(())
    }
}
