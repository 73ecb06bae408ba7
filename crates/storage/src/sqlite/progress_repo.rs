use literacy_core::model::{ChildId, ProgressId, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{child_id_to_i64, conn, map_progress_row, map_progress_row_with_id};
use crate::repository::{ProgressRepository, ProgressRow, StorageError};

fn insert_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => conn(e),
    }
}

/// Insert one progress row on `executor`, which may be a pool or a transaction.
pub(super) async fn insert_progress<'e, E>(
    executor: E,
    record: &ProgressRecord,
) -> Result<ProgressId, StorageError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let time_spent = i64::try_from(record.time_spent_secs())
        .map_err(|_| StorageError::Serialization("time_spent_secs overflow".into()))?;

    let res = sqlx::query(
        r"
            INSERT INTO progress_records (
                child_id, activity_id, completed_at, score_percent,
                time_spent_secs, attempts, mastery
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ",
    )
    .bind(child_id_to_i64(record.child_id())?)
    .bind(record.activity_id().as_str())
    .bind(record.completed_at())
    .bind(i64::from(record.score_percent()))
    .bind(time_spent)
    .bind(i64::from(record.attempts()))
    .bind(record.mastery().as_str())
    .execute(executor)
    .await
    .map_err(insert_err)?;

    Ok(ProgressId::new(res.last_insert_rowid()))
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn append_progress(&self, record: &ProgressRecord) -> Result<ProgressId, StorageError> {
        insert_progress(&self.pool, record).await
    }

    async fn get_progress(&self, id: ProgressId) -> Result<ProgressRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT child_id, activity_id, completed_at, score_percent,
                       time_spent_secs, attempts, mastery
                FROM progress_records
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_progress_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_progress_for_child(
        &self,
        child_id: ChildId,
        limit: u32,
    ) -> Result<Vec<ProgressRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, child_id, activity_id, completed_at, score_percent,
                       time_spent_secs, attempts, mastery
                FROM progress_records
                WHERE child_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(child_id_to_i64(child_id)?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row_with_id).collect()
    }

    async fn list_recent_progress(&self, limit: u32) -> Result<Vec<ProgressRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, child_id, activity_id, completed_at, score_percent,
                       time_spent_secs, attempts, mastery
                FROM progress_records
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row_with_id).collect()
    }
}
