//! Turns a finished attempt into a graded, topic-segmented report.
//!
//! A read-only projection of `(questions, answers)`: scoring never mutates
//! session state, and identical input always produces an identical `Report`.

use std::collections::BTreeMap;

use exam_core::model::{
    Grade, MissedQuestion, Report, TopicAggregate, TopicStanding, percentage,
};

use crate::error::ScoringError;
use crate::exam::ExamSession;

/// Builds the diagnostic report for a finished session.
///
/// The raw score is read from the value frozen on the Finished transition,
/// never re-derived, so every consumer displays the same number.
///
/// # Errors
///
/// Returns `ScoringError::NotFinished` while the attempt is still active.
pub fn score_session(session: &ExamSession) -> Result<Report, ScoringError> {
    let Some(raw_score) = session.score() else {
        return Err(ScoringError::NotFinished);
    };

    let questions = session.questions();
    let answers = session.answers();
    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let pct = percentage(raw_score, total);

    // BTreeMap keeps grouping order independent of insertion order.
    let mut by_topic: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for (question, answer) in questions.iter().zip(answers) {
        let entry = by_topic.entry(question.topic()).or_insert((0, 0));
        entry.0 += 1;
        if *answer == Some(question.correct_index()) {
            entry.1 += 1;
        }
    }

    let mut topic_aggregates: Vec<TopicAggregate> = by_topic
        .into_iter()
        .map(|(topic, (total_questions, correct_count))| TopicAggregate {
            topic: topic.to_string(),
            total_questions,
            correct_count,
        })
        .collect();
    // Weakest first; ties broken by name so equal percentages order stably.
    topic_aggregates.sort_by(|a, b| a.pct().cmp(&b.pct()).then_with(|| a.topic.cmp(&b.topic)));

    let weak_topics: Vec<TopicAggregate> = topic_aggregates
        .iter()
        .filter(|agg| agg.standing() == TopicStanding::Weak)
        .cloned()
        .collect();

    let missed_questions: Vec<MissedQuestion> = questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| **answer != Some(question.correct_index()))
        .map(|(question, answer)| MissedQuestion {
            question: question.clone(),
            given: *answer,
        })
        .collect();

    Ok(Report {
        raw_score,
        total,
        percentage: pct,
        grade: Grade::from_percentage(pct),
        topic_aggregates,
        weak_topics,
        missed_questions,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
