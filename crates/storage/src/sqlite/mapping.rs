use std::str::FromStr;

use literacy_core::model::{
    Activity, ActivityId, ActivityType, Avatar, Child, ChildId, Letter, MasteryLevel, ProgressId,
    ProgressRecord, Track,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{ProgressRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn child_id_from_i64(v: i64) -> Result<ChildId, StorageError> {
    u64::try_from(v)
        .map(ChildId::new)
        .map_err(|_| StorageError::Serialization("child_id sign overflow".into()))
}

pub(crate) fn child_id_to_i64(id: ChildId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("child_id overflow".into()))
}

fn parse<T: FromStr>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    raw.parse::<T>()
        .map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

fn parse_letter(raw: Option<String>) -> Result<Option<Letter>, StorageError> {
    raw.map(|s| {
        let mut chars = s.chars();
        match (chars.next().and_then(Letter::from_char), chars.next()) {
            (Some(letter), None) => Ok(letter),
            _ => Err(StorageError::Serialization(format!(
                "invalid target_letter: {s}"
            ))),
        }
    })
    .transpose()
}

pub(crate) fn map_child_row(row: &SqliteRow) -> Result<Child, StorageError> {
    let avatar: String = row.try_get("avatar").map_err(ser)?;
    let track: String = row.try_get("track").map_err(ser)?;

    Child::from_persisted(
        child_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        u8_from_i64("age", row.try_get::<i64, _>("age").map_err(ser)?)?,
        parse::<Avatar>("avatar", &avatar)?,
        parse::<Track>("track", &track)?,
        u32_from_i64(
            "current_level",
            row.try_get::<i64, _>("current_level").map_err(ser)?,
        )?,
        u32_from_i64(
            "total_points",
            row.try_get::<i64, _>("total_points").map_err(ser)?,
        )?,
        u32_from_i64(
            "daily_streak",
            row.try_get::<i64, _>("daily_streak").map_err(ser)?,
        )?,
        row.try_get("last_activity_date").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_activity_row(row: &SqliteRow) -> Result<Activity, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let activity_type: String = row.try_get("activity_type").map_err(ser)?;
    let track: String = row.try_get("track").map_err(ser)?;

    Activity::from_persisted(
        ActivityId::new(id).map_err(ser)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
        parse::<ActivityType>("activity_type", &activity_type)?,
        parse::<Track>("track", &track)?,
        u32_from_i64("level", row.try_get::<i64, _>("level").map_err(ser)?)?,
        parse_letter(row.try_get("target_letter").map_err(ser)?)?,
        u32_from_i64(
            "estimated_minutes",
            row.try_get::<i64, _>("estimated_minutes").map_err(ser)?,
        )?,
        u32_from_i64(
            "points_value",
            row.try_get::<i64, _>("points_value").map_err(ser)?,
        )?,
        u8_from_i64(
            "minimum_age",
            row.try_get::<i64, _>("minimum_age").map_err(ser)?,
        )?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let activity_id: String = row.try_get("activity_id").map_err(ser)?;
    let mastery: String = row.try_get("mastery").map_err(ser)?;
    let time_spent: i64 = row.try_get("time_spent_secs").map_err(ser)?;

    ProgressRecord::new(
        child_id_from_i64(row.try_get::<i64, _>("child_id").map_err(ser)?)?,
        ActivityId::new(activity_id).map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        u32_from_i64(
            "score_percent",
            row.try_get::<i64, _>("score_percent").map_err(ser)?,
        )?,
        u64::try_from(time_spent).map_err(|_| {
            StorageError::Serialization(format!("invalid time_spent_secs: {time_spent}"))
        })?,
        u32_from_i64("attempts", row.try_get::<i64, _>("attempts").map_err(ser)?)?,
        parse::<MasteryLevel>("mastery", &mastery)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row_with_id(row: &SqliteRow) -> Result<ProgressRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(ProgressRow::new(ProgressId::new(id), map_progress_row(row)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_parse_from_single_characters() {
        assert_eq!(
            parse_letter(Some("B".into())).unwrap(),
            Some(Letter::from('B'))
        );
        assert_eq!(parse_letter(None).unwrap(), None);
        assert!(parse_letter(Some("AB".into())).is_err());
        assert!(parse_letter(Some("7".into())).is_err());
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(child_id_from_i64(-1).is_err());
        assert_eq!(child_id_from_i64(3).unwrap(), ChildId::new(3));
    }
}
