use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates children, the activity catalog, progress records and indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS children (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL CHECK (age BETWEEN 2 AND 10),
                    avatar TEXT NOT NULL,
                    track TEXT NOT NULL,
                    current_level INTEGER NOT NULL CHECK (current_level >= 1),
                    total_points INTEGER NOT NULL CHECK (total_points >= 0),
                    daily_streak INTEGER NOT NULL CHECK (daily_streak >= 0),
                    last_activity_date TEXT,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS activities (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    activity_type TEXT NOT NULL,
                    track TEXT NOT NULL,
                    level INTEGER NOT NULL CHECK (level >= 1),
                    target_letter TEXT,
                    estimated_minutes INTEGER NOT NULL CHECK (estimated_minutes >= 1),
                    points_value INTEGER NOT NULL CHECK (points_value >= 0),
                    minimum_age INTEGER NOT NULL CHECK (minimum_age >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_records (
                    id INTEGER PRIMARY KEY,
                    child_id INTEGER NOT NULL,
                    activity_id TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    score_percent INTEGER NOT NULL CHECK (score_percent BETWEEN 0 AND 100),
                    time_spent_secs INTEGER NOT NULL CHECK (time_spent_secs >= 0),
                    attempts INTEGER NOT NULL CHECK (attempts >= 1),
                    mastery TEXT NOT NULL,
                    FOREIGN KEY (child_id) REFERENCES children(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_progress_records_child_completed
                    ON progress_records (child_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_activities_track_level
                    ON activities (track, level, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied sqlite migration");
    }

    Ok(())
}
