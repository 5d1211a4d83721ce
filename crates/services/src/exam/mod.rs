mod progress;
mod session;
mod timer;

// Public API of the exam subsystem.
pub use crate::error::ExamError;
pub use progress::SessionProgress;
pub use session::{ExamSession, ExamState, FinishOutcome, SECONDS_PER_QUESTION, SessionMode};
pub use timer::SessionTimer;
