use std::fmt;

use crate::model::question::Question;

//
// ─── GRADE ────────────────────────────────────────────────────────────────────
//

/// Letter grade banded from a whole-number percentage.
///
/// Bands are inclusive at the lower bound, contiguous, and exhaustive:
/// `A` >= 85, `B` >= 70, `C` >= 55, `D` >= 40, else `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            85.. => Grade::A,
            70..=84 => Grade::B,
            55..=69 => Grade::C,
            40..=54 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{letter}")
    }
}

//
// ─── TOPIC AGGREGATES ─────────────────────────────────────────────────────────
//

/// Classification of a topic's correctness percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicStanding {
    /// Below 50 percent.
    Weak,
    /// At least 50, below 80 percent.
    Developing,
    /// 80 percent or better.
    Strong,
}

impl TopicStanding {
    #[must_use]
    pub fn from_percentage(pct: u32) -> Self {
        match pct {
            0..=49 => TopicStanding::Weak,
            50..=79 => TopicStanding::Developing,
            _ => TopicStanding::Strong,
        }
    }
}

impl fmt::Display for TopicStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicStanding::Weak => write!(f, "weak"),
            TopicStanding::Developing => write!(f, "developing"),
            TopicStanding::Strong => write!(f, "strong"),
        }
    }
}

/// Per-topic correctness summary; computed once for a finished session and
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicAggregate {
    pub topic: String,
    pub total_questions: u32,
    pub correct_count: u32,
}

impl TopicAggregate {
    /// Correctness percentage, rounded to the nearest whole number.
    #[must_use]
    pub fn pct(&self) -> u32 {
        percentage(self.correct_count, self.total_questions)
    }

    #[must_use]
    pub fn standing(&self) -> TopicStanding {
        TopicStanding::from_percentage(self.pct())
    }

    /// Pre-filled help-request text for remediation prompts.
    ///
    /// Deterministic for a given aggregate; deep links and tests depend on
    /// identical input producing identical text.
    #[must_use]
    pub fn help_request(&self) -> String {
        format!(
            "I scored {}/{} on {} and would like help reviewing this topic.",
            self.correct_count, self.total_questions, self.topic
        )
    }
}

/// Rounded whole-number percentage, 0 when `total` is zero.
#[must_use]
pub fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = f64::from(part) * 100.0 / f64::from(total);
    // round() ties away from zero, matching the product's banding fixtures.
    scaled.round() as u32
}

//
// ─── REPORT ───────────────────────────────────────────────────────────────────
//

/// A question the user got wrong, paired with the answer actually given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedQuestion {
    pub question: Question,
    /// Index the user picked, or `None` when the question went unanswered.
    pub given: Option<usize>,
}

/// Graded, topic-segmented diagnostic for one finished session.
///
/// Purely derived from `(questions, answers)`; building a report never
/// touches session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub raw_score: u32,
    pub total: u32,
    pub percentage: u32,
    pub grade: Grade,
    /// Sorted ascending by percentage so the weakest topics surface first.
    pub topic_aggregates: Vec<TopicAggregate>,
    /// The `Weak` subset of `topic_aggregates`, in the same order.
    pub weak_topics: Vec<TopicAggregate>,
    /// Incorrectly answered questions in original session order.
    pub missed_questions: Vec<MissedQuestion>,
}
