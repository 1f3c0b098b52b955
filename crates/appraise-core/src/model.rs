use crate::context::GradingContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged block of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A few-shot (input, output) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub meta: serde_json::Value,
}

/// Caller input for one evaluation attempt.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub statement: String,
    pub grading_context: GradingContext,
    pub reviewer_identity: Option<String>,
    pub reviewer_predicted_score: Option<f64>,
}

impl EvaluationRequest {
    pub fn new(statement: impl Into<String>, grading_context: GradingContext) -> Self {
        Self {
            statement: statement.into(),
            grading_context,
            reviewer_identity: None,
            reviewer_predicted_score: None,
        }
    }

    pub fn with_reviewer(mut self, identity: impl Into<String>) -> Self {
        self.reviewer_identity = Some(identity.into());
        self
    }

    pub fn with_predicted_score(mut self, score: f64) -> Self {
        self.reviewer_predicted_score = Some(score);
        self
    }
}

/// The unreviewed result held by the workflow between extraction and commit/cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvaluation {
    pub statement: String,
    pub model_score: Option<f64>,
    pub reviewer_score: Option<f64>,
    pub justification: Option<String>,
    pub grading_context: GradingContext,
    pub reviewer_identity: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Full model response, kept for diagnostics. Not persisted.
    pub raw_response: String,
}

impl PendingEvaluation {
    /// A pending evaluation is valid once the model produced a score.
    pub fn is_valid(&self) -> bool {
        self.model_score.is_some()
    }
}

/// Persisted, immutable form of a committed evaluation.
///
/// The grading context is stored by category key; `position` is the
/// zero-based insertion order in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub position: usize,
    pub statement: String,
    pub model_score: Option<f64>,
    pub reviewer_score: Option<f64>,
    pub justification: Option<String>,
    pub award: String,
    pub tier: Option<String>,
    pub wing: Option<String>,
    pub squadron: Option<String>,
    pub reviewer_identity: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationRecord {
    pub fn from_pending(position: usize, pending: &PendingEvaluation) -> Self {
        let ctx = &pending.grading_context;
        Self {
            position,
            statement: pending.statement.clone(),
            model_score: pending.model_score,
            reviewer_score: pending.reviewer_score,
            justification: pending.justification.clone(),
            award: ctx.award.key.clone(),
            tier: ctx.tier.as_ref().map(|c| c.key.clone()),
            wing: ctx.wing_priorities.as_ref().map(|c| c.key.clone()),
            squadron: ctx.squadron_priorities.as_ref().map(|c| c.key.clone()),
            reviewer_identity: pending.reviewer_identity.clone(),
            timestamp: pending.created_at,
        }
    }
}

/// Ordered, append-only sequence of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationTable {
    records: Vec<EvaluationRecord>,
}

impl EvaluationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<EvaluationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvaluationRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&EvaluationRecord> {
        self.records.last()
    }

    /// Appends a pending evaluation at the next position and returns the stored record.
    pub(crate) fn append(&mut self, pending: &PendingEvaluation) -> EvaluationRecord {
        let record = EvaluationRecord::from_pending(self.records.len(), pending);
        self.records.push(record.clone());
        record
    }
}
