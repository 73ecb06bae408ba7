use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Number of choices shown in a quiz round.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// How many of the letter's example words are offered as correct choices.
const CORRECT_OPTION_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub word: String,
    pub is_correct: bool,
}

/// The shuffled choices for the recognition quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRound {
    options: Vec<QuizOption>,
}

impl QuizRound {
    /// Build a round from the first two example words plus distractors, then shuffle.
    ///
    /// Distractors already present in `examples` are skipped, so the round
    /// never contains the same word twice.
    pub fn generate<R: Rng + ?Sized>(examples: &[String], distractors: &[&str], rng: &mut R) -> Self {
        let mut options: Vec<QuizOption> = Vec::with_capacity(QUIZ_OPTION_COUNT);

        for word in examples.iter().take(CORRECT_OPTION_COUNT) {
            if !options.iter().any(|o| o.word == *word) {
                options.push(QuizOption {
                    word: word.clone(),
                    is_correct: true,
                });
            }
        }

        for word in distractors {
            if options.len() == QUIZ_OPTION_COUNT {
                break;
            }
            let taken = options.iter().any(|o| o.word == *word)
                || examples.iter().any(|e| e == word);
            if !taken {
                options.push(QuizOption {
                    word: (*word).to_owned(),
                    is_correct: false,
                });
            }
        }

        options.shuffle(rng);
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.word.as_str())
    }
}

/// Result of submitting a word during the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAnswer {
    /// The word belongs to the letter's example set; the score went up by one.
    Correct,
    /// Recorded, but not one of the letter's example words.
    Incorrect,
    /// Not at the quiz stage, or the round was already answered. Nothing changed.
    Ignored,
}

impl QuizAnswer {
    #[must_use]
    pub fn accepted(self) -> bool {
        self == QuizAnswer::Correct
    }

    /// True when the answer was recorded and an automatic advance is due.
    #[must_use]
    pub fn recorded(self) -> bool {
        self != QuizAnswer::Ignored
    }
}
