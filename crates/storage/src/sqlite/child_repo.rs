use literacy_core::model::{Child, ChildId};

use super::SqliteRepository;
use super::mapping::{child_id_from_i64, child_id_to_i64, conn, map_child_row};
use crate::repository::{ChildRepository, NewChildRecord, StorageError};

#[async_trait::async_trait]
impl ChildRepository for SqliteRepository {
    async fn insert_new_child(&self, child: NewChildRecord) -> Result<ChildId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO children (name, age, avatar, track, current_level, total_points, daily_streak, last_activity_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(child.name)
        .bind(i64::from(child.age))
        .bind(child.avatar.as_str())
        .bind(child.track.as_str())
        .bind(i64::from(child.current_level))
        .bind(i64::from(child.total_points))
        .bind(i64::from(child.daily_streak))
        .bind(child.last_activity_date)
        .bind(child.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        child_id_from_i64(res.last_insert_rowid())
    }

    async fn upsert_child(&self, child: &Child) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO children (id, name, age, avatar, track, current_level, total_points, daily_streak, last_activity_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                avatar = excluded.avatar,
                track = excluded.track,
                current_level = excluded.current_level,
                total_points = excluded.total_points,
                daily_streak = excluded.daily_streak,
                last_activity_date = excluded.last_activity_date
            ",
        )
        .bind(child_id_to_i64(child.id())?)
        .bind(child.name())
        .bind(i64::from(child.age()))
        .bind(child.avatar().as_str())
        .bind(child.track().as_str())
        .bind(i64::from(child.current_level()))
        .bind(i64::from(child.total_points()))
        .bind(i64::from(child.daily_streak()))
        .bind(child.last_activity_date())
        .bind(child.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_child(&self, id: ChildId) -> Result<Option<Child>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, age, avatar, track, current_level, total_points, daily_streak, last_activity_date, created_at
            FROM children WHERE id = ?1
            ",
        )
        .bind(child_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_child_row).transpose()
    }

    async fn list_children(&self, limit: u32) -> Result<Vec<Child>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, age, avatar, track, current_level, total_points, daily_streak, last_activity_date, created_at
            FROM children
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_child_row).collect()
    }

    async fn delete_child(&self, id: ChildId) -> Result<(), StorageError> {
        // progress_records rows go with it through ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM children WHERE id = ?1")
            .bind(child_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
