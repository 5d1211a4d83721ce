mod ids;
mod question;
mod report;

pub use ids::QuestionId;
pub use question::{
    Difficulty, ExamType, OPTION_COUNT, Question, QuestionError, SelectionMode,
};
pub use report::{Grade, MissedQuestion, Report, TopicAggregate, TopicStanding, percentage};
