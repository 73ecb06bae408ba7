use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of stages in every guided activity.
pub const STEP_COUNT: usize = 5;

/// One stage of the guided activity, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStep {
    Introduction,
    SoundPractice,
    WordExamples,
    RecognitionQuiz,
    Completion,
}

impl ActivityStep {
    pub const SEQUENCE: [ActivityStep; STEP_COUNT] = [
        ActivityStep::Introduction,
        ActivityStep::SoundPractice,
        ActivityStep::WordExamples,
        ActivityStep::RecognitionQuiz,
        ActivityStep::Completion,
    ];

    pub const LAST_INDEX: usize = STEP_COUNT - 1;

    /// Stage at `index`, clamped to the terminal stage.
    #[must_use]
    pub fn at(index: usize) -> Self {
        Self::SEQUENCE[index.min(Self::LAST_INDEX)]
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            ActivityStep::Introduction => 0,
            ActivityStep::SoundPractice => 1,
            ActivityStep::WordExamples => 2,
            ActivityStep::RecognitionQuiz => 3,
            ActivityStep::Completion => 4,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == ActivityStep::Completion
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStep::Introduction => "introduction",
            ActivityStep::SoundPractice => "sound_practice",
            ActivityStep::WordExamples => "word_examples",
            ActivityStep::RecognitionQuiz => "recognition_quiz",
            ActivityStep::Completion => "completion",
        }
    }
}

impl fmt::Display for ActivityStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position within the step sequence, for progress bars ("Step 2 of 5").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepProgress {
    pub step: ActivityStep,
    pub step_number: usize,
    pub total: usize,
    pub percent: u32,
}

impl StepProgress {
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        let step = ActivityStep::at(index);
        let step_number = step.index() + 1;
        // step_number <= STEP_COUNT, so the percentage fits in u32.
        let percent = u32::try_from(step_number * 100 / STEP_COUNT).unwrap_or(100);
        Self {
            step,
            step_number,
            total: STEP_COUNT,
            percent,
        }
    }
}
