use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{ActivityId, ChildId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("score percent must be in 0..=100, got {0}")]
    InvalidScore(u32),

    #[error("attempts must be >= 1")]
    InvalidAttempts,

    #[error("unknown mastery level: {0}")]
    UnknownMastery(String),
}

//
// ─── MASTERY ───────────────────────────────────────────────────────────────────
//

/// Qualitative label summarising skill attainment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    #[default]
    NotStarted,
    Developing,
    Proficient,
    Mastered,
}

impl MasteryLevel {
    pub const ALL: [MasteryLevel; 4] = [
        MasteryLevel::NotStarted,
        MasteryLevel::Developing,
        MasteryLevel::Proficient,
        MasteryLevel::Mastered,
    ];

    /// Label for a finished attempt scored as a percentage.
    #[must_use]
    pub fn from_score_percent(percent: u32) -> Self {
        match percent {
            90.. => MasteryLevel::Mastered,
            70..=89 => MasteryLevel::Proficient,
            _ => MasteryLevel::Developing,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MasteryLevel::NotStarted => "not_started",
            MasteryLevel::Developing => "developing",
            MasteryLevel::Proficient => "proficient",
            MasteryLevel::Mastered => "mastered",
        }
    }
}

impl FromStr for MasteryLevel {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MasteryLevel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ProgressError::UnknownMastery(s.to_owned()))
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// History entry written when a child finishes an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    child_id: ChildId,
    activity_id: ActivityId,
    completed_at: DateTime<Utc>,
    score_percent: u32,
    time_spent_secs: u64,
    attempts: u32,
    mastery: MasteryLevel,
}

impl ProgressRecord {
    /// # Errors
    ///
    /// Returns `ProgressError` if the score exceeds 100 or attempts is zero.
    pub fn new(
        child_id: ChildId,
        activity_id: ActivityId,
        completed_at: DateTime<Utc>,
        score_percent: u32,
        time_spent_secs: u64,
        attempts: u32,
        mastery: MasteryLevel,
    ) -> Result<Self, ProgressError> {
        if score_percent > 100 {
            return Err(ProgressError::InvalidScore(score_percent));
        }
        if attempts == 0 {
            return Err(ProgressError::InvalidAttempts);
        }
        Ok(Self {
            child_id,
            activity_id,
            completed_at,
            score_percent,
            time_spent_secs,
            attempts,
            mastery,
        })
    }

    #[must_use]
    pub fn child_id(&self) -> ChildId {
        self.child_id
    }

    #[must_use]
    pub fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score_percent(&self) -> u32 {
        self.score_percent
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn mastery(&self) -> MasteryLevel {
        self.mastery
    }
}
