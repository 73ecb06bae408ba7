use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::quiz::{QuizAnswer, QuizRound};
use super::step::{ActivityStep, StepProgress};
use crate::lessons::ContentProvider;
use crate::model::{Letter, MasteryLevel};

/// Points credited for finishing a guided activity, independent of the quiz score.
pub const COMPLETION_REWARD_POINTS: u32 = 25;

/// Each session contains exactly one quiz round.
pub const QUIZ_ROUNDS: u32 = 1;

/// Display name used when the caller does not supply one.
pub const DEFAULT_CHILD_NAME: &str = "Student";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Everything the completion sink needs once a session reaches the final stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCompletion {
    pub session_id: SessionId,
    pub letter: Letter,
    pub points_awarded: u32,
    pub score: u32,
    pub quiz_rounds: u32,
    pub attempts: u32,
    pub elapsed: TimeDelta,
    pub completed_at: DateTime<Utc>,
}

impl ActivityCompletion {
    /// Quiz score as a percentage of the available rounds.
    #[must_use]
    pub fn score_percent(&self) -> u32 {
        if self.quiz_rounds == 0 {
            return 0;
        }
        (self.score.min(self.quiz_rounds) * 100) / self.quiz_rounds
    }

    #[must_use]
    pub fn mastery(&self) -> MasteryLevel {
        MasteryLevel::from_score_percent(self.score_percent())
    }

    /// Whole seconds between start and completion, never negative.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        u64::try_from(self.elapsed.num_seconds()).unwrap_or(0)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through the guided activity for a single child and letter.
///
/// The step index only moves forward; `restart` is the only way back and it
/// bumps `generation`, so work scheduled against an earlier generation can be
/// recognised as stale.
#[derive(Debug, Clone)]
pub struct ActivitySession {
    id: SessionId,
    generation: u64,
    letter: Letter,
    child_name: String,
    examples: Vec<String>,
    quiz: QuizRound,
    step_index: usize,
    score: u32,
    selected_answers: Vec<String>,
    quiz_answered: bool,
    attempts: u32,
    started_at: DateTime<Utc>,
}

impl ActivitySession {
    /// Open a session at the introduction stage with a zero score.
    pub fn start<R: Rng + ?Sized>(
        letter: Letter,
        child_name: &str,
        content: &dyn ContentProvider,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Self {
        let examples: Vec<String> = content
            .example_words(letter)
            .iter()
            .map(|w| (*w).to_owned())
            .collect();
        let quiz = QuizRound::generate(&examples, content.distractors(), rng);
        let child_name = match child_name.trim() {
            "" => DEFAULT_CHILD_NAME.to_owned(),
            name => name.to_owned(),
        };

        Self {
            id: SessionId::random(),
            generation: 0,
            letter,
            child_name,
            examples,
            quiz,
            step_index: 0,
            score: 0,
            selected_answers: Vec::new(),
            quiz_answered: false,
            attempts: 1,
            started_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn letter(&self) -> Letter {
        self.letter
    }

    #[must_use]
    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    #[must_use]
    pub fn example_words(&self) -> &[String] {
        &self.examples
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizRound {
        &self.quiz
    }

    #[must_use]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    #[must_use]
    pub fn current_step(&self) -> ActivityStep {
        ActivityStep::at(self.step_index)
    }

    #[must_use]
    pub fn progress(&self) -> StepProgress {
        StepProgress::for_index(self.step_index)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn selected_answers(&self) -> &[String] {
        &self.selected_answers
    }

    #[must_use]
    pub fn quiz_answered(&self) -> bool {
        self.quiz_answered
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_step().is_terminal()
    }

    /// Move to the next stage. Returns `false` (and does nothing) at the terminal stage.
    pub fn advance(&mut self) -> bool {
        if self.step_index >= ActivityStep::LAST_INDEX {
            return false;
        }
        self.step_index += 1;
        true
    }

    /// Record a quiz choice.
    ///
    /// Only the first choice during the recognition quiz counts; anything else
    /// is `Ignored` and leaves the session untouched.
    pub fn submit_quiz_answer(&mut self, word: &str) -> QuizAnswer {
        if self.current_step() != ActivityStep::RecognitionQuiz || self.quiz_answered {
            return QuizAnswer::Ignored;
        }

        let word = word.trim();
        let correct = self.examples.iter().any(|e| e == word);
        if correct {
            self.score += 1;
        }
        self.selected_answers.push(word.to_owned());
        self.quiz_answered = true;

        if correct {
            QuizAnswer::Correct
        } else {
            QuizAnswer::Incorrect
        }
    }

    /// Apply the deferred advance that follows a quiz answer.
    ///
    /// Returns `false` if `generation` is stale or the session already left the
    /// quiz stage, so a late timer can never move a restarted session.
    pub fn apply_auto_advance(&mut self, generation: u64) -> bool {
        if generation != self.generation
            || self.current_step() != ActivityStep::RecognitionQuiz
            || !self.quiz_answered
        {
            return false;
        }
        self.advance()
    }

    /// Return to the introduction with a fresh score, keeping letter and child.
    pub fn restart<R: Rng + ?Sized>(&mut self, content: &dyn ContentProvider, rng: &mut R) {
        self.generation += 1;
        self.attempts = self.attempts.saturating_add(1);
        self.step_index = 0;
        self.score = 0;
        self.selected_answers.clear();
        self.quiz_answered = false;
        self.quiz = QuizRound::generate(&self.examples, content.distractors(), rng);
    }

    /// Reward for a finished session, or `None` before the completion stage.
    #[must_use]
    pub fn complete(&self, completed_at: DateTime<Utc>) -> Option<ActivityCompletion> {
        if !self.is_complete() {
            return None;
        }
        let elapsed = (completed_at - self.started_at).max(TimeDelta::zero());
        Some(ActivityCompletion {
            session_id: self.id,
            letter: self.letter,
            points_awarded: COMPLETION_REWARD_POINTS,
            score: self.score,
            quiz_rounds: QUIZ_ROUNDS,
            attempts: self.attempts,
            elapsed,
            completed_at,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::StaticContentProvider;
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn start(letter: &str, name: &str) -> ActivitySession {
        let mut rng = StdRng::seed_from_u64(42);
        ActivitySession::start(
            Letter::parse_or_fallback(letter),
            name,
            &StaticContentProvider::new(),
            &mut rng,
            fixed_now(),
        )
    }

    fn to_quiz(session: &mut ActivitySession) {
        for _ in 0..3 {
            session.advance();
        }
        assert_eq!(session.current_step(), ActivityStep::RecognitionQuiz);
    }

    #[test]
    fn start_is_at_introduction_with_zero_score() {
        let session = start("A", "Emma");
        assert_eq!(session.step_index(), 0);
        assert_eq!(session.current_step(), ActivityStep::Introduction);
        assert_eq!(session.score(), 0);
        assert!(session.selected_answers().is_empty());
        assert_eq!(session.child_name(), "Emma");
        assert_eq!(session.attempts(), 1);
    }

    #[test]
    fn advance_n_times_lands_on_min_n_and_last() {
        for n in 0..10 {
            let mut session = start("B", "Leo");
            for _ in 0..n {
                session.advance();
            }
            assert_eq!(session.step_index(), n.min(4));
        }
    }

    #[test]
    fn advance_is_noop_at_completion() {
        let mut session = start("C", "Mia");
        for _ in 0..4 {
            assert!(session.advance());
        }
        assert!(!session.advance());
        assert!(session.is_complete());
    }

    #[test]
    fn correct_answer_scores_once() {
        let mut session = start("A", "Emma");
        to_quiz(&mut session);
        assert_eq!(session.submit_quiz_answer("Apple"), QuizAnswer::Correct);
        assert_eq!(session.score(), 1);
        assert_eq!(session.selected_answers(), ["Apple"]);

        assert_eq!(session.submit_quiz_answer("Ant"), QuizAnswer::Ignored);
        assert_eq!(session.score(), 1);
        assert_eq!(session.selected_answers().len(), 1);
    }

    #[test]
    fn distractor_leaves_score_unchanged() {
        let mut session = start("A", "Emma");
        to_quiz(&mut session);
        let answer = session.submit_quiz_answer("Zebra");
        assert_eq!(answer, QuizAnswer::Incorrect);
        assert!(!answer.accepted());
        assert!(answer.recorded());
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected_answers(), ["Zebra"]);
    }

    #[test]
    fn answers_outside_quiz_are_ignored() {
        let mut session = start("A", "Emma");
        assert_eq!(session.submit_quiz_answer("Apple"), QuizAnswer::Ignored);
        assert_eq!(session.score(), 0);
        assert!(session.selected_answers().is_empty());
    }

    #[test]
    fn restart_resets_score_and_index_but_keeps_letter() {
        let mut session = start("D", "Noah");
        to_quiz(&mut session);
        session.submit_quiz_answer("Dog");
        let before = session.generation();

        let mut rng = StdRng::seed_from_u64(9);
        session.restart(&StaticContentProvider::new(), &mut rng);

        assert_eq!(session.step_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.selected_answers().is_empty());
        assert!(!session.quiz_answered());
        assert_eq!(session.letter().upper(), 'D');
        assert_eq!(session.child_name(), "Noah");
        assert_eq!(session.generation(), before + 1);
        assert_eq!(session.attempts(), 2);
    }

    #[test]
    fn stale_auto_advance_is_rejected() {
        let mut session = start("A", "Emma");
        to_quiz(&mut session);
        session.submit_quiz_answer("Apple");
        let scheduled = session.generation();

        let mut rng = StdRng::seed_from_u64(5);
        session.restart(&StaticContentProvider::new(), &mut rng);
        to_quiz(&mut session);

        assert!(!session.apply_auto_advance(scheduled));
        assert_eq!(session.current_step(), ActivityStep::RecognitionQuiz);
    }

    #[test]
    fn auto_advance_requires_answered_quiz() {
        let mut session = start("A", "Emma");
        to_quiz(&mut session);
        assert!(!session.apply_auto_advance(session.generation()));
        session.submit_quiz_answer("Zebra");
        assert!(session.apply_auto_advance(session.generation()));
        assert!(!session.apply_auto_advance(session.generation()));
        assert_eq!(session.step_index(), 4);
    }

    #[test]
    fn complete_returns_fixed_reward_regardless_of_score() {
        let mut scored = start("A", "Emma");
        to_quiz(&mut scored);
        scored.submit_quiz_answer("Apple");
        scored.advance();

        let mut unscored = start("A", "Emma");
        to_quiz(&mut unscored);
        unscored.submit_quiz_answer("Zebra");
        unscored.advance();

        let now = fixed_now() + TimeDelta::seconds(300);
        let a = scored.complete(now).unwrap();
        let b = unscored.complete(now).unwrap();
        assert_eq!(a.points_awarded, COMPLETION_REWARD_POINTS);
        assert_eq!(b.points_awarded, COMPLETION_REWARD_POINTS);
        assert_eq!(a.score_percent(), 100);
        assert_eq!(a.mastery(), MasteryLevel::Mastered);
        assert_eq!(b.score_percent(), 0);
        assert_eq!(b.mastery(), MasteryLevel::Developing);
        assert_eq!(a.elapsed_secs(), 300);
    }

    #[test]
    fn complete_is_none_before_final_stage() {
        let session = start("A", "Emma");
        assert!(session.complete(fixed_now()).is_none());
    }

    #[test]
    fn emma_scenario() {
        let mut session = start("A", "Emma");
        session.advance();
        session.advance();
        session.advance();
        let answer = session.submit_quiz_answer("Apple");
        assert!(answer.accepted());
        assert_eq!(session.score(), 1);
        assert!(session.apply_auto_advance(session.generation()));
        assert_eq!(session.step_index(), 4);
        assert_eq!(session.current_step(), ActivityStep::Completion);
        assert_eq!(session.complete(fixed_now()).unwrap().points_awarded, 25);
    }

    #[test]
    fn unknown_letter_falls_back_to_default_words() {
        let session = start("Z", "Leo");
        assert_eq!(session.letter().upper(), 'Z');
        assert_eq!(session.example_words(), ["Apple", "Ant", "Airplane"]);
    }

    #[test]
    fn blank_child_name_uses_default() {
        let session = start("A", "  ");
        assert_eq!(session.child_name(), DEFAULT_CHILD_NAME);
    }
}
