//! Single-slot review workflow.
//!
//! `Idle` → `request_evaluation` → `Pending` → `commit` | `cancel` → `Idle`.
//! At most one pending evaluation exists per instance. A new request while
//! pending replaces the slot; a failed request leaves the workflow idle.

use crate::context::GradingCatalog;
use crate::errors::{EvalError, Result};
use crate::model::{EvaluationRecord, EvaluationRequest, Example, PendingEvaluation};
use crate::parse;
use crate::prompt::PromptTemplate;
use crate::providers::llm::CompletionClient;
use crate::redaction::RedactionPolicy;
use crate::storage::Store;
use chrono::Utc;
use std::sync::Arc;

pub struct Workflow {
    template: PromptTemplate,
    examples: Vec<Example>,
    client: Arc<dyn CompletionClient>,
    store: Store,
    redaction: RedactionPolicy,
    pending: Option<PendingEvaluation>,
}

impl Workflow {
    pub fn new(
        template: PromptTemplate,
        examples: Vec<Example>,
        client: Arc<dyn CompletionClient>,
        store: Store,
    ) -> Self {
        Self {
            template,
            examples,
            client,
            store,
            redaction: RedactionPolicy::default(),
            pending: None,
        }
    }

    pub fn from_catalog(
        catalog: &GradingCatalog,
        client: Arc<dyn CompletionClient>,
        store: Store,
    ) -> Self {
        Self::new(
            catalog.template(),
            catalog.examples().to_vec(),
            client,
            store,
        )
    }

    pub fn with_redaction(mut self, redaction: RedactionPolicy) -> Self {
        self.redaction = redaction;
        self
    }

    /// Grades one statement and holds the result as the pending evaluation.
    ///
    /// Calls the completion client exactly once. A response without a score
    /// still produces a pending evaluation (see [`Self::is_valid_pending`]);
    /// prompt or upstream failures return an error and leave the workflow idle.
    pub async fn request_evaluation(
        &mut self,
        request: EvaluationRequest,
    ) -> Result<PendingEvaluation> {
        if let Some(prev) = self.pending.take() {
            tracing::info!(
                event = "pending_replaced",
                previous_score = ?prev.model_score,
                previous_created_at = %prev.created_at.to_rfc3339()
            );
        }

        let ctx = &request.grading_context;
        let messages = self
            .template
            .build_prompt(&request.statement, ctx, &self.examples)?;

        tracing::info!(
            event = "evaluation_requested",
            provider = self.client.provider_name(),
            statement = %self.redaction.redact_prompt(request.statement.trim()),
            award = %ctx.award.key,
            tier = ctx.tier.as_ref().map(|c| c.key.as_str()).unwrap_or("-"),
            messages = messages.len()
        );
        tracing::debug!(
            event = "prompt_built",
            prompt = ?self.redaction.redact_messages(&messages)
        );

        let response = match self.client.complete(&messages).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(event = "completion_failed", provider = self.client.provider_name(), error = %e);
                return Err(EvalError::Upstream(e));
            }
        };
        tracing::info!(
            event = "completion_received",
            provider = %response.provider,
            model = %response.model,
            chars = response.text.len()
        );

        let parsed = parse::parse(&response.text);
        if parsed.is_miss() {
            tracing::warn!(
                event = "parse_miss",
                has_justification = parsed.justification.is_some(),
                "no total score in model response"
            );
        }

        let pending = PendingEvaluation {
            statement: request.statement,
            model_score: parsed.score,
            reviewer_score: request.reviewer_predicted_score,
            justification: parsed.justification,
            grading_context: request.grading_context,
            reviewer_identity: request.reviewer_identity,
            created_at: Utc::now(),
            raw_response: response.text,
        };
        self.pending = Some(pending.clone());
        Ok(pending)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True when pending and the model produced a score. Gate "accept" on this.
    pub fn is_valid_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(PendingEvaluation::is_valid)
    }

    pub fn view_pending(&self) -> Result<&PendingEvaluation> {
        self.pending.as_ref().ok_or(EvalError::NoPendingEvaluation)
    }

    /// Appends the pending evaluation to the store and persists it.
    ///
    /// The slot is cleared before the flush, so a second call reports
    /// `NothingToCommit` even when the flush failed; use
    /// [`Self::retry_persist`] to retry the write.
    pub fn commit(&mut self) -> Result<EvaluationRecord> {
        let pending = match self.pending.take() {
            None => {
                tracing::info!(event = "nothing_to_commit");
                return Err(EvalError::NothingToCommit);
            }
            Some(p) if !p.is_valid() => {
                self.pending = Some(p);
                return Err(EvalError::InvalidState(
                    "pending evaluation has no model score and cannot be committed".into(),
                ));
            }
            Some(p) => p,
        };

        let record = self.store.commit_pending(&pending)?;
        tracing::info!(
            event = "evaluation_committed",
            position = record.position,
            score = ?record.model_score,
            rows = self.store.len()
        );
        Ok(record)
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(p) => {
                tracing::info!(event = "evaluation_cancelled", score = ?p.model_score);
                Ok(())
            }
            None => {
                tracing::info!(event = "nothing_to_cancel");
                Err(EvalError::NoPendingEvaluation)
            }
        }
    }

    /// Re-runs the durable flush after a failed commit. Never re-appends.
    pub fn retry_persist(&self) -> Result<()> {
        self.store.persist()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
