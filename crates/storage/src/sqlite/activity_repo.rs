use literacy_core::model::{Activity, ActivityId};

use super::SqliteRepository;
use super::mapping::{conn, map_activity_row};
use crate::repository::{ActivityRepository, StorageError};

#[async_trait::async_trait]
impl ActivityRepository for SqliteRepository {
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), StorageError> {
        let target_letter = activity.target_letter().map(|l| l.upper().to_string());

        sqlx::query(
            r"
            INSERT INTO activities (id, title, description, activity_type, track, level, target_letter, estimated_minutes, points_value, minimum_age)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                activity_type = excluded.activity_type,
                track = excluded.track,
                level = excluded.level,
                target_letter = excluded.target_letter,
                estimated_minutes = excluded.estimated_minutes,
                points_value = excluded.points_value,
                minimum_age = excluded.minimum_age
            ",
        )
        .bind(activity.id().as_str())
        .bind(activity.title())
        .bind(activity.description())
        .bind(activity.activity_type().as_str())
        .bind(activity.track().as_str())
        .bind(i64::from(activity.level()))
        .bind(target_letter)
        .bind(i64::from(activity.estimated_minutes()))
        .bind(i64::from(activity.points_value()))
        .bind(i64::from(activity.minimum_age()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_activity(&self, id: &ActivityId) -> Result<Option<Activity>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, activity_type, track, level, target_letter, estimated_minutes, points_value, minimum_age
            FROM activities WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_activity_row).transpose()
    }

    async fn list_activities(&self, limit: u32) -> Result<Vec<Activity>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, activity_type, track, level, target_letter, estimated_minutes, points_value, minimum_age
            FROM activities
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_activity_row).collect()
    }
}
