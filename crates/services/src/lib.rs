#![forbid(unsafe_code)]

pub mod error;
pub mod exam;
pub mod randomizer;
pub mod resolver;
pub mod scoring;
pub mod source;

pub use exam_core::Clock;

pub use error::{ExamError, ResolveError, ScoringError, SourceError};
pub use exam::{
    ExamSession, ExamState, FinishOutcome, SECONDS_PER_QUESTION, SessionMode, SessionProgress,
    SessionTimer,
};
pub use resolver::{QuestionResolver, ResolveGuard, ResolveToken};
pub use scoring::score_session;
pub use source::{QuestionSource, RemoteQuestionSource, SourceConfig, SourceGroup, SourceRequest};
