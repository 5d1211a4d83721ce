use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::model::Question;

use super::progress::SessionProgress;
use crate::error::ExamError;

/// Countdown budget per question.
pub const SECONDS_PER_QUESTION: u32 = 60;

//
// ─── STATES & MODES ───────────────────────────────────────────────────────────
//

/// Lifecycle of an attempt. Construction is the Setup → Active transition;
/// Finished is terminal, a retry builds a brand-new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamState {
    Active,
    Finished,
}

/// Governs when correctness and explanations become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Locking in an answer reveals it immediately.
    Practice,
    /// Nothing is revealed until the attempt finishes.
    TimedExam,
}

/// Outcome of a finish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The attempt is incomplete; the caller must show the counts and call
    /// [`ExamSession::confirm_finish`] to actually transition.
    Confirm { answered: usize, total: usize },
    /// The session is now (or already was) finished.
    Finished,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// The state machine owning one exam or practice attempt.
///
/// All per-attempt state lives here: the question list (fixed at start), the
/// parallel answer/flag/reveal vectors, the cursor, the countdown, and the
/// frozen final score. Nothing outside this type mutates any of it.
pub struct ExamSession {
    mode: SessionMode,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    flags: Vec<bool>,
    revealed: Vec<bool>,
    cursor: usize,
    remaining_seconds: u32,
    state: ExamState,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    score: Option<u32>,
}

impl ExamSession {
    /// Starts an attempt over a resolved, shuffled question list.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Empty` if no questions are provided.
    pub fn new(
        questions: Vec<Question>,
        mode: SessionMode,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::Empty);
        }

        let len = questions.len();
        let budget =
            u32::try_from(len).unwrap_or(u32::MAX).saturating_mul(SECONDS_PER_QUESTION);

        Ok(Self {
            mode,
            questions,
            answers: vec![None; len],
            flags: vec![false; len],
            revealed: vec![false; len],
            cursor: 0,
            remaining_seconds: budget,
            state: ExamState::Active,
            started_at,
            finished_at: None,
            score: None,
        })
    }

    //
    // ─── ACCESSORS ────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> ExamState {
        self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == ExamState::Finished
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    #[must_use]
    pub fn revealed(&self) -> &[bool] {
        &self.revealed
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The question the cursor points at.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Final score, frozen once on the transition to Finished.
    ///
    /// Components displaying a final score must read it from here rather than
    /// re-deriving it from the answer vector.
    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Returns a summary of the current attempt progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            answered: self.answered_count(),
            flagged: self.flags.iter().filter(|f| **f).count(),
            remaining_seconds: self.remaining_seconds,
            is_finished: self.is_finished(),
        }
    }

    //
    // ─── OPERATIONS ───────────────────────────────────────────────────────
    //

    /// Locks in an answer for the current question. The first answer binds;
    /// there is no changing it afterwards.
    ///
    /// In `Practice` mode the question is revealed immediately; in `TimedExam`
    /// mode reveal waits for the finish transition.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Finished` after the attempt ended,
    /// `ExamError::OutOfRange` for a choice index past the options, and
    /// `ExamError::AlreadyAnswered` when the slot is already set.
    pub fn select_answer(&mut self, choice: usize) -> Result<(), ExamError> {
        if self.is_finished() {
            return Err(ExamError::Finished);
        }
        let options = self.current_question().options().len();
        if choice >= options {
            return Err(ExamError::OutOfRange {
                index: choice,
                len: options,
            });
        }
        if self.answers[self.cursor].is_some() {
            return Err(ExamError::AlreadyAnswered { index: self.cursor });
        }

        self.answers[self.cursor] = Some(choice);
        if self.mode == SessionMode::Practice {
            self.revealed[self.cursor] = true;
        }
        Ok(())
    }

    /// Flips the advisory flag on the current question and returns the new
    /// value. Never affects scoring or reveal state.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Finished` after the attempt ended.
    pub fn toggle_flag(&mut self) -> Result<bool, ExamError> {
        if self.is_finished() {
            return Err(ExamError::Finished);
        }
        self.flags[self.cursor] = !self.flags[self.cursor];
        Ok(self.flags[self.cursor])
    }

    /// Moves the cursor. Free navigation: the target need not be answered,
    /// and nothing at the destination is reset or revealed.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Finished` after the attempt ended and
    /// `ExamError::OutOfRange` for an index past the question list.
    pub fn go_to(&mut self, index: usize) -> Result<(), ExamError> {
        if self.is_finished() {
            return Err(ExamError::Finished);
        }
        if index >= self.questions.len() {
            return Err(ExamError::OutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.cursor = index;
        Ok(())
    }

    /// One second of countdown. At zero the attempt is forced to Finished
    /// exactly as if the user had confirmed, unanswered questions scoring as
    /// incorrect. A tick after Finished is a no-op, never an error.
    pub fn tick(&mut self, now: DateTime<Utc>) -> ExamState {
        if self.is_finished() {
            return self.state;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.finish(now);
        }
        self.state
    }

    /// Asks to finish the attempt.
    ///
    /// A complete attempt finishes immediately. An incomplete one returns the
    /// answered/total counts for a confirmation step; the transition only
    /// happens once the caller follows up with [`confirm_finish`].
    ///
    /// [`confirm_finish`]: ExamSession::confirm_finish
    pub fn request_finish(&mut self, now: DateTime<Utc>) -> FinishOutcome {
        if self.is_finished() {
            return FinishOutcome::Finished;
        }
        let answered = self.answered_count();
        let total = self.total_questions();
        if answered < total {
            return FinishOutcome::Confirm { answered, total };
        }
        self.finish(now);
        FinishOutcome::Finished
    }

    /// Finishes the attempt regardless of unanswered questions. Idempotent.
    pub fn confirm_finish(&mut self, now: DateTime<Utc>) {
        self.finish(now);
    }

    /// The single Finished entry point. Computes and freezes the score
    /// exactly once; a concurrent second trigger (timer hitting zero the same
    /// tick the user confirms) finds the state already terminal and returns.
    fn finish(&mut self, now: DateTime<Utc>) {
        if self.is_finished() {
            return;
        }
        let score = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.correct_index()))
            .count();
        self.score = Some(u32::try_from(score).unwrap_or(u32::MAX));
        self.revealed.fill(true);
        self.finished_at = Some(now);
        self.state = ExamState::Finished;
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("answered", &self.answered_count())
            .field("remaining_seconds", &self.remaining_seconds)
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionId;
    use exam_core::time::fixed_now;

    fn build_question(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}?"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            "why",
            "Topic",
        )
        .unwrap()
    }

    fn build_session(count: u64, mode: SessionMode) -> ExamSession {
        let questions = (0..count).map(|i| build_question(i, 0)).collect();
        ExamSession::new(questions, mode, fixed_now()).unwrap()
    }

    #[test]
    fn empty_session_is_rejected() {
        let err = ExamSession::new(Vec::new(), SessionMode::TimedExam, fixed_now()).unwrap_err();
        assert_eq!(err, ExamError::Empty);
    }

    #[test]
    fn entry_seeds_countdown_and_blank_state() {
        let session = build_session(3, SessionMode::TimedExam);
        assert_eq!(session.state(), ExamState::Active);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.remaining_seconds(), 180);
        assert!(session.answers().iter().all(Option::is_none));
        assert!(session.flags().iter().all(|f| !f));
        assert!(session.revealed().iter().all(|r| !r));
    }

    #[test]
    fn first_answer_binds() {
        let mut session = build_session(2, SessionMode::TimedExam);
        session.select_answer(1).unwrap();
        let err = session.select_answer(3).unwrap_err();
        assert_eq!(err, ExamError::AlreadyAnswered { index: 0 });
        assert_eq!(session.answers()[0], Some(1));
    }

    #[test]
    fn answer_choice_is_range_checked() {
        let mut session = build_session(2, SessionMode::TimedExam);
        let err = session.select_answer(4).unwrap_err();
        assert_eq!(err, ExamError::OutOfRange { index: 4, len: 4 });
        assert_eq!(session.answers()[0], None);
    }

    #[test]
    fn practice_mode_reveals_on_answer_exam_mode_does_not() {
        let mut practice = build_session(1, SessionMode::Practice);
        practice.select_answer(0).unwrap();
        assert!(practice.revealed()[0]);

        let mut exam = build_session(1, SessionMode::TimedExam);
        exam.select_answer(0).unwrap();
        assert!(!exam.revealed()[0]);
    }

    #[test]
    fn flag_toggles_freely_and_never_reveals() {
        let mut session = build_session(2, SessionMode::TimedExam);
        assert!(session.toggle_flag().unwrap());
        assert!(!session.toggle_flag().unwrap());
        assert!(session.toggle_flag().unwrap());
        assert!(!session.revealed()[0]);
        assert_eq!(session.progress().flagged, 1);
    }

    #[test]
    fn navigation_is_free_and_range_checked() {
        let mut session = build_session(3, SessionMode::TimedExam);
        session.go_to(2).unwrap();
        assert_eq!(session.cursor(), 2);
        session.go_to(0).unwrap();
        assert_eq!(session.cursor(), 0);

        let err = session.go_to(3).unwrap_err();
        assert_eq!(err, ExamError::OutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn timer_forces_finish_and_late_tick_is_noop() {
        let mut session = build_session(1, SessionMode::TimedExam);
        session.select_answer(0).unwrap();

        for _ in 0..59 {
            assert_eq!(session.tick(fixed_now()), ExamState::Active);
        }
        assert_eq!(session.tick(fixed_now()), ExamState::Finished);
        let frozen = session.score();
        assert_eq!(frozen, Some(1));

        // A second trigger after the transition must not re-score.
        assert_eq!(session.tick(fixed_now()), ExamState::Finished);
        assert_eq!(session.score(), frozen);
    }

    #[test]
    fn timeout_scores_unanswered_as_incorrect() {
        let mut session = build_session(2, SessionMode::TimedExam);
        session.select_answer(0).unwrap();
        while session.state() == ExamState::Active {
            session.tick(fixed_now());
        }
        assert_eq!(session.score(), Some(1));
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[test]
    fn incomplete_finish_needs_confirmation() {
        let mut session = build_session(3, SessionMode::TimedExam);
        session.select_answer(0).unwrap();

        let outcome = session.request_finish(fixed_now());
        assert_eq!(
            outcome,
            FinishOutcome::Confirm {
                answered: 1,
                total: 3
            }
        );
        assert_eq!(session.state(), ExamState::Active);

        session.confirm_finish(fixed_now());
        assert_eq!(session.state(), ExamState::Finished);
        assert_eq!(session.score(), Some(1));
    }

    #[test]
    fn complete_finish_is_immediate() {
        let mut session = build_session(2, SessionMode::TimedExam);
        session.select_answer(0).unwrap();
        session.go_to(1).unwrap();
        session.select_answer(2).unwrap();

        assert_eq!(session.request_finish(fixed_now()), FinishOutcome::Finished);
        assert_eq!(session.score(), Some(1));
        assert_eq!(session.finished_at(), Some(fixed_now()));
    }

    #[test]
    fn finish_reveals_everything() {
        let mut session = build_session(2, SessionMode::TimedExam);
        session.confirm_finish(fixed_now());
        assert!(session.revealed().iter().all(|r| *r));
    }

    #[test]
    fn finished_session_rejects_mutation() {
        let mut session = build_session(2, SessionMode::TimedExam);
        session.confirm_finish(fixed_now());

        assert_eq!(session.select_answer(0), Err(ExamError::Finished));
        assert_eq!(session.toggle_flag(), Err(ExamError::Finished));
        assert_eq!(session.go_to(1), Err(ExamError::Finished));
    }

    #[test]
    fn concurrent_finish_triggers_freeze_one_score() {
        let mut session = build_session(1, SessionMode::TimedExam);
        session.select_answer(0).unwrap();
        for _ in 0..60 {
            session.tick(fixed_now());
        }
        assert_eq!(session.state(), ExamState::Finished);

        // User confirmation landing on the same instant as the timeout.
        session.confirm_finish(fixed_now());
        assert_eq!(session.score(), Some(1));
    }
}
