use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use spacesweep_application::ports::{ChildStream, DeleteReport, SpaceStore, SpaceStream};
use spacesweep_domain::config::sweep::MAX_BATCH_SIZE;
use spacesweep_domain::{ChildKind, ChildRecord, ChildTimestamp, DomainError, SpaceId};
use sqlx::SqlitePool;
use tracing::{debug, error, instrument, warn};

const DEFAULT_PAGE_SIZE: u32 = 300;
const DEFAULT_BATCH_SIZE: usize = 450;

/// Keyset position of a paginated listing.
enum Cursor {
    Start,
    After(String),
    Done,
}

impl Cursor {
    fn next_after(rows_len: usize, page_size: i64, last_id: Option<&str>) -> Self {
        match last_id {
            Some(id) if rows_len as i64 >= page_size => Cursor::After(id.to_string()),
            _ => Cursor::Done,
        }
    }
}

/// Spaces and their child documents kept in SQLite.
///
/// Child documents store their body as JSON in `space_documents.fields`;
/// only the liveness field of each collection is decoded.
pub struct SqliteSpaceStore {
    pool: SqlitePool,
    page_size: i64,
    batch_size: usize,
}

impl SqliteSpaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE as i64,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1) as i64;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn decode_timestamp(kind: ChildKind, fields: &str) -> ChildTimestamp {
        let value: Value = match serde_json::from_str(fields) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, collection = %kind, "Undecodable document body");
                return ChildTimestamp::Missing;
            }
        };

        match value.get(kind.timestamp_field()) {
            Some(Value::String(raw)) => ChildTimestamp::parse_rfc3339(raw),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(millis) => ChildTimestamp::from_epoch_millis(millis),
                None => n
                    .as_f64()
                    .filter(|millis| millis.is_finite())
                    .map(|millis| ChildTimestamp::from_epoch_millis(millis.trunc() as i64))
                    .unwrap_or(ChildTimestamp::Missing),
            },
            _ => ChildTimestamp::Missing,
        }
    }

    fn build_delete_sql(n: usize) -> String {
        const HEADER: &str =
            "DELETE FROM space_documents WHERE space_id = ? AND collection = ? AND id IN (";
        let mut sql = String::with_capacity(HEADER.len() + n * 2 + 1);
        sql.push_str(HEADER);
        for i in 0..n {
            if i > 0 {
                sql.push(',');
            }
            sql.push('?');
        }
        sql.push(')');
        sql
    }

    async fn delete_chunk(
        &self,
        space_id: &SpaceId,
        kind: ChildKind,
        chunk: &[String],
    ) -> Result<(), DomainError> {
        let sql = Self::build_delete_sql(chunk.len());
        let mut query = sqlx::query(&sql)
            .bind(space_id.as_str())
            .bind(kind.collection_name());
        for id in chunk {
            query = query.bind(id.as_str());
        }

        query.execute(&self.pool).await.map_err(|e| {
            warn!(error = %e, space_id = %space_id, collection = %kind, size = chunk.len(), "Delete chunk failed");
            DomainError::DeleteError(e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl SpaceStore for SqliteSpaceStore {
    fn list_spaces(&self) -> SpaceStream<'_> {
        let page_size = self.page_size;
        stream::try_unfold(Cursor::Start, move |cursor| async move {
            let after = match cursor {
                Cursor::Start => None,
                Cursor::After(id) => Some(id),
                Cursor::Done => return Ok(None),
            };

            let rows: Vec<(String,)> = sqlx::query_as(
                "SELECT id FROM spaces
                 WHERE (?1 IS NULL OR id > ?1)
                 ORDER BY id LIMIT ?2",
            )
            .bind(after.as_deref())
            .bind(page_size)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list spaces");
                DomainError::ReadError(e.to_string())
            })?;

            if rows.is_empty() {
                return Ok(None);
            }
            let next = Cursor::next_after(rows.len(), page_size, rows.last().map(|r| r.0.as_str()));
            let page: Vec<SpaceId> = rows.into_iter().map(|(id,)| SpaceId::from(id)).collect();
            Ok::<_, DomainError>(Some((page, next)))
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, DomainError>)))
        .try_flatten()
        .boxed()
    }

    fn list_children(&self, space_id: &SpaceId, kind: ChildKind) -> ChildStream<'_> {
        let page_size = self.page_size;
        let space_id = space_id.clone();
        stream::try_unfold(Cursor::Start, move |cursor| {
            let space_id = space_id.clone();
            async move {
                let after = match cursor {
                    Cursor::Start => None,
                    Cursor::After(id) => Some(id),
                    Cursor::Done => return Ok(None),
                };

                let rows: Vec<(String, String)> = sqlx::query_as(
                    "SELECT id, fields FROM space_documents
                     WHERE space_id = ?1 AND collection = ?2 AND (?3 IS NULL OR id > ?3)
                     ORDER BY id LIMIT ?4",
                )
                .bind(space_id.as_str())
                .bind(kind.collection_name())
                .bind(after.as_deref())
                .bind(page_size)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    error!(error = %e, space_id = %space_id, collection = %kind, "Failed to list documents");
                    DomainError::ReadError(e.to_string())
                })?;

                if rows.is_empty() {
                    return Ok(None);
                }
                let next =
                    Cursor::next_after(rows.len(), page_size, rows.last().map(|r| r.0.as_str()));
                let page: Vec<ChildRecord> = rows
                    .into_iter()
                    .map(|(id, fields)| {
                        let timestamp = Self::decode_timestamp(kind, &fields);
                        ChildRecord::new(id, timestamp)
                    })
                    .collect();
                Ok::<_, DomainError>(Some((page, next)))
            }
        })
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, DomainError>)))
        .try_flatten()
        .boxed()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_children(
        &self,
        space_id: &SpaceId,
        kind: ChildKind,
        ids: &[String],
    ) -> Result<DeleteReport, DomainError> {
        let mut report = DeleteReport::default();
        for chunk in ids.chunks(self.batch_size) {
            let result = self.delete_chunk(space_id, kind, chunk).await;
            report.record_chunk(chunk, result);
        }

        debug!(
            deleted = report.deleted,
            failed = report.failed_ids.len(),
            "Delete finished"
        );
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn set_user_count(&self, space_id: &SpaceId, count: u64) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE spaces SET current_user_count = ?, updated_at = ? WHERE id = ?",
        )
        .bind(i64::try_from(count).unwrap_or(i64::MAX))
        .bind(Utc::now().timestamp_millis())
        .bind(space_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update currentUserCount");
            DomainError::WriteError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SpaceRemoved(space_id.to_string()));
        }
        Ok(())
    }
}
