//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::SelectionMode;

/// Failures talking to the remote question source.
///
/// Every variant is transient from the engine's point of view: the resolver
/// absorbs them all and moves on to the next sourcing tier. None of these is
/// ever shown to the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("question source request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question source rejected the request: {0}")]
    Rejected(String),
    #[error("question source returned no topic groups")]
    EmptyResponse,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `QuestionResolver`.
///
/// Only total exhaustion of every sourcing tier escapes to the caller; it is
/// surfaced as a user-facing message at the setup stage, never retried
/// automatically.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("no questions available for {subject} ({mode})")]
    NoQuestionsAvailable {
        subject: String,
        mode: SelectionMode,
    },
}

/// Errors emitted by `ExamSession` operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already finished")]
    Finished,
    #[error("question {index} already has a locked-in answer")]
    AlreadyAnswered { index: usize },
    #[error("index {index} is out of range for {len} entries")]
    OutOfRange { index: usize, len: usize },
}

/// Errors emitted by the scoring engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("session has not finished yet")]
    NotFinished,
}
