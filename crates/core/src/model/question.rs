use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Fixed option arity for multiple-choice questions in this design.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur while constructing a `Question`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text must not be empty")]
    EmptyText,

    #[error("expected {expected} options, got {got}")]
    WrongOptionCount { expected: usize, got: usize },

    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },

    #[error("option order {got:?} is not a permutation of 0..{len}")]
    InvalidOptionOrder { got: Vec<usize>, len: usize },
}

//
// ─── EXAM TYPE & SELECTION MODE ───────────────────────────────────────────────
//

/// Exam period a question set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Midterm,
    Final,
}

impl ExamType {
    /// Infers the exam type from a free-form term label.
    ///
    /// A label containing "mid" (case-insensitive) maps to `Midterm`;
    /// anything else, including a missing label, maps to `Final`.
    #[must_use]
    pub fn from_term_label(label: Option<&str>) -> Self {
        match label {
            Some(term) if term.to_ascii_lowercase().contains("mid") => Self::Midterm,
            _ => Self::Final,
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamType::Midterm => write!(f, "midterm"),
            ExamType::Final => write!(f, "final"),
        }
    }
}

impl FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "midterm" | "mid" => Ok(Self::Midterm),
            "final" => Ok(Self::Final),
            other => Err(format!("unknown exam type: {other}")),
        }
    }
}

/// The axis along which a user requests a question set.
///
/// Exactly one parameter applies per request; matching is exhaustive at the
/// resolver boundary so there is never a question of which field to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Questions for an exam period (curated file preferred upstream).
    ExamType(ExamType),
    /// Questions synthesized from a lecture range expression, e.g. "1-22" or "10,12,15".
    LectureRange(String),
    /// Questions synthesized from arbitrary topic text.
    FreeTopic(String),
}

impl SelectionMode {
    /// Requested exam type, when this mode carries one.
    #[must_use]
    pub fn exam_type(&self) -> Option<ExamType> {
        match self {
            SelectionMode::ExamType(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::ExamType(t) => write!(f, "exam-type {t}"),
            SelectionMode::LectureRange(r) => write!(f, "lectures {r}"),
            SelectionMode::FreeTopic(t) => write!(f, "topic {t}"),
        }
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// Informational difficulty label; never consulted by scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One assessable multiple-choice item.
///
/// Immutable once constructed. Reordering options goes through
/// [`Question::with_option_order`], which returns a new value and recomputes
/// the correct index from the correct option's content, so the original stays
/// intact for retry-with-same-source flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: String,
    topic: String,
    difficulty: Option<Difficulty>,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` for a blank prompt,
    /// `QuestionError::WrongOptionCount` unless exactly [`OPTION_COUNT`]
    /// options are given, and `QuestionError::CorrectIndexOutOfRange` when
    /// the correct index does not address an option.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: impl Into<String>,
        topic: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount {
                expected: OPTION_COUNT,
                got: options.len(),
            });
        }
        if correct_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            text,
            options,
            correct_index,
            explanation: explanation.into(),
            topic: topic.into(),
            difficulty: None,
        })
    }

    /// Attaches an informational difficulty label.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Returns a copy whose topic label is replaced.
    ///
    /// Used when the owning topic group's name is more specific than whatever
    /// the source put on the question itself.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Returns a copy with options rearranged into the given order.
    ///
    /// `order[i]` names the old position of the option that ends up at `i`.
    /// The correct index is recomputed by locating the correct option's
    /// content in the new order, so content, not position, stays authoritative.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidOptionOrder` if `order` is not a
    /// permutation of `0..options.len()`.
    pub fn with_option_order(&self, order: &[usize]) -> Result<Self, QuestionError> {
        let len = self.options.len();
        let mut seen = vec![false; len];
        for &pos in order {
            if pos >= len || seen[pos] {
                return Err(QuestionError::InvalidOptionOrder {
                    got: order.to_vec(),
                    len,
                });
            }
            seen[pos] = true;
        }
        if order.len() != len {
            return Err(QuestionError::InvalidOptionOrder {
                got: order.to_vec(),
                len,
            });
        }

        let correct_text = &self.options[self.correct_index];
        let options: Vec<String> = order.iter().map(|&pos| self.options[pos].clone()).collect();
        let correct_index = options
            .iter()
            .position(|o| o == correct_text)
            .expect("correct option content survives any permutation");

        Ok(Self {
            id: self.id,
            text: self.text.clone(),
            options,
            correct_index,
            explanation: self.explanation.clone(),
            topic: self.topic.clone(),
            difficulty: self.difficulty,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into(), "d".into()]
    }

    fn build_question() -> Question {
        Question::new(QuestionId::new(1), "Q?", options(), 2, "because c", "Topic").unwrap()
    }

    #[test]
    fn rejects_empty_text() {
        let err = Question::new(QuestionId::new(1), "  ", options(), 0, "", "T").unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn rejects_wrong_option_count() {
        let err = Question::new(
            QuestionId::new(1),
            "Q?",
            vec!["a".into(), "b".into()],
            0,
            "",
            "T",
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::WrongOptionCount { got: 2, .. }));
    }

    #[test]
    fn rejects_out_of_range_correct_index() {
        let err = Question::new(QuestionId::new(1), "Q?", options(), 4, "", "T").unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectIndexOutOfRange { index: 4, len: 4 }
        ));
    }

    #[test]
    fn reorder_tracks_correct_content() {
        let q = build_question();
        let reordered = q.with_option_order(&[3, 2, 1, 0]).unwrap();
        assert_eq!(reordered.correct_index(), 1);
        assert_eq!(reordered.correct_option(), "c");
        // Original untouched.
        assert_eq!(q.correct_index(), 2);
    }

    #[test]
    fn reorder_rejects_non_permutation() {
        let q = build_question();
        assert!(q.with_option_order(&[0, 0, 1, 2]).is_err());
        assert!(q.with_option_order(&[0, 1, 2]).is_err());
        assert!(q.with_option_order(&[0, 1, 2, 4]).is_err());
    }

    #[test]
    fn exam_type_inferred_from_term_label() {
        assert_eq!(
            ExamType::from_term_label(Some("Midterm Exam")),
            ExamType::Midterm
        );
        assert_eq!(ExamType::from_term_label(Some("MID-SEMESTER")), ExamType::Midterm);
        assert_eq!(ExamType::from_term_label(Some("Final Exam")), ExamType::Final);
        assert_eq!(ExamType::from_term_label(None), ExamType::Final);
    }
}
