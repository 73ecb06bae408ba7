//! Guided letter activity: a fixed five-stage sequence with one quiz round.

mod quiz;
mod session;
mod step;

pub use quiz::{QUIZ_OPTION_COUNT, QuizAnswer, QuizOption, QuizRound};
pub use session::{
    ActivityCompletion, ActivitySession, COMPLETION_REWARD_POINTS, DEFAULT_CHILD_NAME,
    QUIZ_ROUNDS, SessionId,
};
pub use step::{ActivityStep, STEP_COUNT, StepProgress};
