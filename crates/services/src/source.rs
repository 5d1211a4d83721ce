//! Client for the remote question-source collaborator.
//!
//! The collaborator answers a single logical request: given a subject, a
//! selection mode, and a count, it returns named topic groups of questions,
//! served from a curated file when one exists or synthesized on demand. This
//! module owns the wire format and the HTTP plumbing; the resolver owns what
//! happens when the collaborator fails.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use exam_core::model::{Difficulty, Question, QuestionError, QuestionId, SelectionMode};

use crate::error::SourceError;

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl SourceConfig {
    /// Reads the source endpoint from the environment.
    ///
    /// Returns `None` when `EXAM_SOURCE_URL` is unset or blank, in which case
    /// the resolver works from the static bank alone.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EXAM_SOURCE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("EXAM_SOURCE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        Some(Self { base_url, api_key })
    }
}

//
// ─── WIRE FORMAT ──────────────────────────────────────────────────────────────
//

/// Request body sent to the collaborator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequest {
    pub subject: String,
    pub count: usize,
    pub mode: &'static str,
    pub mode_param: String,
}

impl SourceRequest {
    #[must_use]
    pub fn new(subject: &str, mode: &SelectionMode, count: usize) -> Self {
        let (mode_name, mode_param) = match mode {
            SelectionMode::ExamType(t) => ("examType", t.to_string()),
            SelectionMode::LectureRange(range) => ("lecture", range.clone()),
            SelectionMode::FreeTopic(topic) => ("topic", topic.clone()),
        };
        Self {
            subject: subject.to_string(),
            count,
            mode: mode_name,
            mode_param,
        }
    }
}

/// One named topic group in a successful response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceGroup {
    pub name: String,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub questions: Vec<WireQuestion>,
}

/// A question as it appears on the wire.
///
/// The collaborator may omit ids, explanations, and topics; the resolver
/// fills those in while flattening.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireQuestion {
    #[serde(default)]
    pub id: Option<u64>,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl WireQuestion {
    /// Converts the wire shape into a validated domain question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the payload violates question invariants
    /// (wrong option arity, out-of-range correct index, blank text).
    pub fn into_question(
        self,
        fallback_id: QuestionId,
        topic: &str,
    ) -> Result<Question, QuestionError> {
        let id = self.id.map_or(fallback_id, QuestionId::new);
        let question = Question::new(
            id,
            self.text,
            self.options,
            self.correct_index,
            self.explanation.unwrap_or_default(),
            topic,
        )?;
        Ok(match self.difficulty {
            Some(d) => question.with_difficulty(d),
            None => question,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SourcePayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    groups: Vec<SourceGroup>,
}

//
// ─── SOURCE TRAIT & REMOTE CLIENT ─────────────────────────────────────────────
//

/// The external question-source collaborator.
///
/// The engine's only network boundary; implementations must not retry on
/// their own, the resolver decides what a failure means.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetches topic groups for the given request.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` on transport failure, non-success status, an
    /// explicit error payload, or an empty group list.
    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<SourceGroup>, SourceError>;
}

/// HTTP implementation of [`QuestionSource`].
#[derive(Clone)]
pub struct RemoteQuestionSource {
    client: Client,
    config: SourceConfig,
}

impl RemoteQuestionSource {
    #[must_use]
    pub fn new(config: SourceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl QuestionSource for RemoteQuestionSource {
    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<SourceGroup>, SourceError> {
        let url = format!("{}/questions", self.config.base_url.trim_end_matches('/'));

        let mut builder = self.client.post(url).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }

        let payload: SourcePayload = response.json().await?;
        if let Some(error) = payload.error {
            // Caller-visible failure in a 2xx envelope; do not parse further.
            return Err(SourceError::Rejected(error));
        }
        if payload.groups.is_empty() {
            return Err(SourceError::EmptyResponse);
        }

        Ok(payload.groups)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::ExamType;

    #[test]
    fn request_serializes_mode_variants() {
        let req = SourceRequest::new("CS101", &SelectionMode::ExamType(ExamType::Midterm), 5);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mode"], "examType");
        assert_eq!(json["modeParam"], "midterm");
        assert_eq!(json["subject"], "CS101");
        assert_eq!(json["count"], 5);

        let req = SourceRequest::new("CS101", &SelectionMode::LectureRange("1-22".into()), 10);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mode"], "lecture");
        assert_eq!(json["modeParam"], "1-22");

        let req = SourceRequest::new("CS101", &SelectionMode::FreeTopic("recursion".into()), 3);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mode"], "topic");
        assert_eq!(json["modeParam"], "recursion");
    }

    #[test]
    fn payload_with_error_field_short_circuits() {
        let payload: SourcePayload =
            serde_json::from_str(r#"{"error":"subject not found"}"#).unwrap();
        assert_eq!(payload.error.as_deref(), Some("subject not found"));
        assert!(payload.groups.is_empty());
    }

    #[test]
    fn groups_parse_with_optional_term() {
        let raw = r#"{
            "groups": [
                {
                    "name": "Hardware",
                    "term": "Midterm Exam",
                    "questions": [
                        {"text": "Q1", "options": ["a","b","c","d"], "correctIndex": 0}
                    ]
                },
                {"name": "Loops", "questions": []}
            ]
        }"#;
        let payload: SourcePayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.groups.len(), 2);
        assert_eq!(payload.groups[0].term.as_deref(), Some("Midterm Exam"));
        assert_eq!(payload.groups[1].term, None);
        assert_eq!(payload.groups[0].questions[0].correct_index, 0);
    }

    #[test]
    fn wire_question_fills_id_and_topic() {
        let wire = WireQuestion {
            id: None,
            text: "Q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 3,
            explanation: None,
            difficulty: Some(Difficulty::Easy),
        };
        let q = wire.into_question(QuestionId::new(7), "Hardware").unwrap();
        assert_eq!(q.id(), QuestionId::new(7));
        assert_eq!(q.topic(), "Hardware");
        assert_eq!(q.difficulty(), Some(Difficulty::Easy));
    }

    #[test]
    fn wire_question_rejects_bad_arity() {
        let wire = WireQuestion {
            id: Some(1),
            text: "Q?".into(),
            options: vec!["a".into(), "b".into()],
            correct_index: 0,
            explanation: None,
            difficulty: None,
        };
        assert!(wire.into_question(QuestionId::new(1), "T").is_err());
    }
}
