//! Layered question sourcing.
//!
//! Resolution runs a short-circuiting pipeline: ask the remote collaborator,
//! flatten and exam-type-filter what comes back, and fall through to the
//! static bank when the network tier errors or yields nothing usable. Only
//! total exhaustion surfaces to the caller; transport failures never do.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use exam_core::QuestionBank;
use exam_core::model::{ExamType, Question, QuestionId, SelectionMode};

use crate::error::ResolveError;
use crate::randomizer;
use crate::source::{QuestionSource, SourceGroup, SourceRequest};

//
// ─── RESOLVER ─────────────────────────────────────────────────────────────────
//

/// Resolves a non-empty question list for a subject and selection mode, or
/// fails explicitly. Stateless between invocations.
pub struct QuestionResolver {
    source: Arc<dyn QuestionSource>,
    bank: QuestionBank,
}

impl QuestionResolver {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, bank: QuestionBank) -> Self {
        Self { source, bank }
    }

    /// Produces `requested_count` shuffled questions for the request.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::NoQuestionsAvailable` when every sourcing tier
    /// comes up empty. Network and payload failures are absorbed as "try the
    /// next tier" and are never propagated.
    pub async fn resolve(
        &self,
        subject: &str,
        mode: &SelectionMode,
        requested_count: usize,
    ) -> Result<Vec<Question>, ResolveError> {
        let request = SourceRequest::new(subject, mode, requested_count);
        let remote = match self.source.fetch(&request).await {
            Ok(groups) => select_from_groups(groups, mode),
            Err(_) => Vec::new(),
        };

        let candidates = if remote.is_empty() {
            self.bank_fallback(subject, mode)
        } else {
            remote
        };

        if candidates.is_empty() {
            return Err(ResolveError::NoQuestionsAvailable {
                subject: subject.to_string(),
                mode: mode.clone(),
            });
        }

        let mut rng = rand::rng();
        Ok(randomizer::draw(&candidates, requested_count, &mut rng))
    }

    fn bank_fallback(&self, subject: &str, mode: &SelectionMode) -> Vec<Question> {
        match mode.exam_type() {
            Some(exam_type) => self.bank.curated(subject, exam_type),
            // Exam period is meaningless for lecture-range and free-topic
            // requests; fall back to the subject's whole curated pool.
            None => self.bank.curated_all(subject),
        }
    }
}

/// Flattens topic groups into one tagged sequence and applies the exam-type
/// filter for exam-type requests.
///
/// When filtering empties the set, the unfiltered sequence is kept: synthesized
/// content often arrives without a usable term label.
fn select_from_groups(groups: Vec<SourceGroup>, mode: &SelectionMode) -> Vec<Question> {
    let flattened = flatten_groups(groups);

    let Some(wanted) = mode.exam_type() else {
        return flattened.into_iter().map(|(q, _)| q).collect();
    };

    let matching: Vec<Question> = flattened
        .iter()
        .filter(|(_, t)| *t == wanted)
        .map(|(q, _)| q.clone())
        .collect();

    if matching.is_empty() {
        flattened.into_iter().map(|(q, _)| q).collect()
    } else {
        matching
    }
}

/// Flattens groups into `(question, inferred exam type)` pairs, tagging each
/// question with its owning group's name as topic. Malformed wire questions
/// are skipped; the tier just yields fewer usable items.
fn flatten_groups(groups: Vec<SourceGroup>) -> Vec<(Question, ExamType)> {
    let mut out = Vec::new();
    let mut next_id = 1_u64;
    for group in groups {
        let exam_type = ExamType::from_term_label(group.term.as_deref());
        for wire in group.questions {
            let fallback = QuestionId::new(next_id);
            next_id += 1;
            if let Ok(question) = wire.into_question(fallback, &group.name) {
                out.push((question, exam_type));
            }
        }
    }
    out
}

//
// ─── STALE-RESPONSE GUARD ─────────────────────────────────────────────────────
//

/// Generation counter guarding against stale resolutions.
///
/// The setup flow begins each resolution through the guard and only accepts a
/// result whose token is still current. Starting another resolution, or
/// abandoning setup, orphans every in-flight token, so a late response can
/// never feed a session the user has moved past.
#[derive(Clone, Debug, Default)]
pub struct ResolveGuard {
    generation: Arc<AtomicU64>,
}

impl ResolveGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new resolution, invalidating all previously issued tokens.
    #[must_use]
    pub fn begin(&self) -> ResolveToken {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ResolveToken {
            generation: Arc::clone(&self.generation),
            issued,
        }
    }

    /// Invalidates every outstanding token without starting a new resolution.
    /// Called when setup is abandoned.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Identity of one resolution attempt.
#[derive(Debug)]
pub struct ResolveToken {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl ResolveToken {
    /// True while no newer resolution has begun and setup was not abandoned.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.issued
    }

    /// Keeps `value` only if this token is still current.
    #[must_use]
    pub fn accept<T>(&self, value: T) -> Option<T> {
        self.is_current().then_some(value)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
