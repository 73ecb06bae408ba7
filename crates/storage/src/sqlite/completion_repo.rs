use literacy_core::model::{Child, ProgressId, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{child_id_to_i64, conn};
use super::progress_repo::insert_progress;
use crate::repository::{CompletionPersistence, StorageError};

#[async_trait::async_trait]
impl CompletionPersistence for SqliteRepository {
    async fn record_completion(
        &self,
        child: &Child,
        record: &ProgressRecord,
    ) -> Result<ProgressId, StorageError> {
        if record.child_id() != child.id() {
            return Err(StorageError::Conflict);
        }

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Plain UPDATE: a child deleted since it was read must stay deleted.
        let res = sqlx::query(
            r"
            UPDATE children SET
                current_level = ?2,
                total_points = ?3,
                daily_streak = ?4,
                last_activity_date = ?5
            WHERE id = ?1
            ",
        )
        .bind(child_id_to_i64(child.id())?)
        .bind(i64::from(child.current_level()))
        .bind(i64::from(child.total_points()))
        .bind(i64::from(child.daily_streak()))
        .bind(child.last_activity_date())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let id = insert_progress(&mut *tx, record).await?;
        tx.commit().await.map_err(conn)?;
        Ok(id)
    }
}
