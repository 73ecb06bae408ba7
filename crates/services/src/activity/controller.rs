use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use literacy_core::flow::{
    ActivityCompletion, ActivitySession, ActivityStep, QuizAnswer, QuizOption, StepProgress,
};
use literacy_core::lessons::ContentProvider;
use literacy_core::model::Letter;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Pending,
    InFlight,
    Delivered,
}

/// A held delivery claim, valid only for the session generation it was taken on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeliveryClaim {
    pub(crate) generation: u64,
    pub(crate) completion: ActivityCompletion,
}

struct ControllerState {
    session: ActivitySession,
    delivery: Delivery,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one `ActivitySession` and owns its deferred auto-advance.
///
/// A recorded quiz answer schedules a single advance after `advance_delay`.
/// The scheduled task is aborted by `restart`, `advance` and drop, and it
/// re-checks the session generation before touching anything.
pub struct ActivityController {
    state: Arc<Mutex<ControllerState>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    content: Arc<dyn ContentProvider>,
    clock: Clock,
    advance_delay: Duration,
}

impl ActivityController {
    /// Open a new session for `letter` at the introduction step.
    #[must_use]
    pub fn start(
        letter: Letter,
        child_name: &str,
        content: Arc<dyn ContentProvider>,
        clock: Clock,
        advance_delay: Duration,
    ) -> Self {
        let session = ActivitySession::start(
            letter,
            child_name,
            content.as_ref(),
            &mut rand::rng(),
            clock.now(),
        );
        Self::from_session(session, content, clock, advance_delay)
    }

    /// Wrap an existing session, e.g. one built with a seeded RNG.
    #[must_use]
    pub fn from_session(
        session: ActivitySession,
        content: Arc<dyn ContentProvider>,
        clock: Clock,
        advance_delay: Duration,
    ) -> Self {
        tracing::info!(
            session = %session.id(),
            letter = %session.letter(),
            child = session.child_name(),
            "activity session started"
        );
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                session,
                delivery: Delivery::Pending,
            })),
            pending: Mutex::new(None),
            content,
            clock,
            advance_delay,
        }
    }

    /// Copy of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> ActivitySession {
        lock(&self.state).session.clone()
    }

    #[must_use]
    pub fn letter(&self) -> Letter {
        lock(&self.state).session.letter()
    }

    #[must_use]
    pub fn current_step(&self) -> ActivityStep {
        lock(&self.state).session.current_step()
    }

    #[must_use]
    pub fn step_index(&self) -> usize {
        lock(&self.state).session.step_index()
    }

    #[must_use]
    pub fn progress(&self) -> StepProgress {
        lock(&self.state).session.progress()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        lock(&self.state).session.score()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        lock(&self.state).session.generation()
    }

    #[must_use]
    pub fn example_words(&self) -> Vec<String> {
        lock(&self.state).session.example_words().to_vec()
    }

    #[must_use]
    pub fn quiz_options(&self) -> Vec<QuizOption> {
        lock(&self.state).session.quiz().options().to_vec()
    }

    #[must_use]
    pub fn advance_delay(&self) -> Duration {
        self.advance_delay
    }

    /// True while an auto-advance is scheduled and has not yet run.
    #[must_use]
    pub fn has_pending_advance(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Manual "next" from the UI. Any scheduled auto-advance is dropped.
    pub fn advance(&self) -> bool {
        self.cancel_pending();
        let mut state = lock(&self.state);
        let moved = state.session.advance();
        if moved {
            tracing::debug!(step = %state.session.current_step(), "advanced");
        }
        moved
    }

    /// Record a quiz choice and schedule the automatic advance if it counted.
    pub fn submit_quiz_answer(&self, word: &str) -> QuizAnswer {
        let (answer, generation) = {
            let mut state = lock(&self.state);
            let answer = state.session.submit_quiz_answer(word);
            (answer, state.session.generation())
        };

        tracing::info!(word, ?answer, generation, "quiz answer submitted");
        if answer.recorded() {
            self.schedule_auto_advance(generation);
        }
        answer
    }

    /// Start over at the introduction with a fresh quiz, same letter and child.
    pub fn restart(&self) {
        self.cancel_pending();
        let mut state = lock(&self.state);
        state
            .session
            .restart(self.content.as_ref(), &mut rand::rng());
        // Any claim on the previous run no longer applies to this session.
        state.delivery = Delivery::Pending;
        tracing::info!(
            generation = state.session.generation(),
            attempts = state.session.attempts(),
            "activity session restarted"
        );
    }

    /// The reward for a finished session, `None` before the completion step.
    #[must_use]
    pub fn complete(&self) -> Option<ActivityCompletion> {
        lock(&self.state).session.complete(self.clock.now())
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        lock(&self.state).delivery == Delivery::Delivered
    }

    /// Claim the completion for delivery. Only one caller can hold the claim.
    pub(crate) fn begin_delivery(&self) -> Result<Option<DeliveryClaim>, Delivery> {
        let mut state = lock(&self.state);
        if state.delivery != Delivery::Pending {
            return Err(state.delivery);
        }
        let generation = state.session.generation();
        let claim = state
            .session
            .complete(self.clock.now())
            .map(|completion| DeliveryClaim {
                generation,
                completion,
            });
        if claim.is_some() {
            state.delivery = Delivery::InFlight;
        }
        Ok(claim)
    }

    /// Settle a claim. Ignored if the session was restarted since it was taken.
    pub(crate) fn end_delivery(&self, generation: u64, delivered: bool) {
        let mut state = lock(&self.state);
        if state.session.generation() != generation {
            tracing::debug!(
                generation,
                current = state.session.generation(),
                delivered,
                "delivery result for a restarted session ignored"
            );
            return;
        }
        state.delivery = if delivered {
            Delivery::Delivered
        } else {
            Delivery::Pending
        };
    }

    fn schedule_auto_advance(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let delay = self.advance_delay;
        let task = async move {
            tokio::time::sleep(delay).await;
            apply_auto_advance(&state, generation);
        };

        match Handle::try_current() {
            Ok(handle) => {
                let previous = lock(&self.pending).replace(handle.spawn(task));
                if let Some(previous) = previous {
                    previous.abort();
                }
            }
            Err(_) => {
                tracing::warn!(generation, "no tokio runtime; advancing without delay");
                apply_auto_advance(&self.state, generation);
            }
        }
    }

    fn cancel_pending(&self) {
        if let Some(handle) = lock(&self.pending).take() {
            if !handle.is_finished() {
                tracing::debug!("pending auto-advance aborted");
            }
            handle.abort();
        }
    }
}

impl Drop for ActivityController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn apply_auto_advance(state: &Mutex<ControllerState>, generation: u64) {
    let mut state = lock(state);
    if state.session.apply_auto_advance(generation) {
        tracing::debug!(generation, step = %state.session.current_step(), "auto-advanced");
    } else {
        tracing::debug!(
            generation,
            current = state.session.generation(),
            "stale auto-advance ignored"
        );
    }
}
