use appraise_core::context::{ContextKeys, GradingCatalog, GradingContext};
use appraise_core::model::EvaluationRequest;
use appraise_core::providers::llm::fake::FakeClient;
use appraise_core::storage::Store;
use appraise_core::{EvalError, Workflow};
use std::sync::Arc;

const STATEMENT: &str = "- Led 3 teams, delivered 40% faster reporting.";

fn context(catalog: &GradingCatalog) -> GradingContext {
    catalog
        .context(&ContextKeys {
            award: "Performer of the Month".into(),
            tier: Some("NCO".into()),
            wing: Some("480 ISRW".into()),
            squadron: Some("N/A".into()),
        })
        .expect("builtin keys resolve")
}

fn setup(store: Store) -> anyhow::Result<(Workflow, Arc<FakeClient>, GradingContext)> {
    let catalog = GradingCatalog::builtin()?;
    let client = Arc::new(FakeClient::new("fake-model"));
    let wf = Workflow::from_catalog(&catalog, client.clone(), store);
    Ok((wf, client, context(&catalog)))
}

#[tokio::test]
async fn scored_response_commits_one_row() -> anyhow::Result<()> {
    let (mut wf, client, ctx) = setup(Store::in_memory()?)?;
    client.push_response("...analysis...\nTotal Score: 14.5/20");

    let pending = wf
        .request_evaluation(EvaluationRequest::new(STATEMENT, ctx).with_reviewer("msgt.doe"))
        .await?;
    assert_eq!(pending.model_score, Some(14.5));
    assert_eq!(pending.justification.as_deref(), Some("...analysis..."));
    assert!(wf.is_valid_pending());
    assert_eq!(client.calls(), 1);

    let sent = client.last_request().expect("request recorded");
    assert_eq!(sent.last().map(|m| m.content.as_str()), Some(STATEMENT));

    let record = wf.commit()?;
    assert_eq!(record.position, 0);
    assert_eq!(record.model_score, Some(14.5));
    assert_eq!(record.award, "Performer of the Month");
    assert_eq!(record.squadron, None);
    assert_eq!(record.reviewer_identity.as_deref(), Some("msgt.doe"));
    assert_eq!(wf.store().len(), 1);
    assert!(!wf.has_pending());
    Ok(())
}

#[tokio::test]
async fn missing_marker_blocks_commit() -> anyhow::Result<()> {
    let (mut wf, client, ctx) = setup(Store::in_memory()?)?;
    client.push_response("I cannot grade this statement.");

    let pending = wf
        .request_evaluation(EvaluationRequest::new(STATEMENT, ctx))
        .await?;
    assert_eq!(pending.model_score, None);
    assert!(wf.has_pending());
    assert!(!wf.is_valid_pending());

    let err = wf.commit().unwrap_err();
    assert!(matches!(err, EvalError::InvalidState(_)));
    // Still pending so the caller can inspect and cancel.
    assert!(wf.view_pending().is_ok());
    assert_eq!(wf.store().len(), 0);

    wf.cancel()?;
    assert!(!wf.has_pending());
    Ok(())
}

#[tokio::test]
async fn second_commit_reports_nothing_to_commit() -> anyhow::Result<()> {
    let (mut wf, _client, ctx) = setup(Store::in_memory()?)?;
    wf.request_evaluation(EvaluationRequest::new(STATEMENT, ctx))
        .await?;

    let before = wf.store().len();
    wf.commit()?;
    let err = wf.commit().unwrap_err();
    assert!(matches!(err, EvalError::NothingToCommit));
    assert!(err.is_idle_signal());
    assert_eq!(wf.store().len(), before + 1);
    Ok(())
}

#[tokio::test]
async fn cancel_clears_slot_without_writing() -> anyhow::Result<()> {
    let (mut wf, _client, ctx) = setup(Store::in_memory()?)?;
    wf.request_evaluation(EvaluationRequest::new(STATEMENT, ctx))
        .await?;

    wf.cancel()?;
    assert!(!wf.has_pending());
    assert_eq!(wf.store().len(), 0);
    assert!(matches!(
        wf.view_pending().unwrap_err(),
        EvalError::NoPendingEvaluation
    ));
    assert!(matches!(
        wf.cancel().unwrap_err(),
        EvalError::NoPendingEvaluation
    ));
    Ok(())
}

#[tokio::test]
async fn second_request_replaces_pending() -> anyhow::Result<()> {
    let (mut wf, client, ctx) = setup(Store::in_memory()?)?;
    client.push_response("first\nTotal Score: 5/20");
    client.push_response("second\nTotal Score: 9/20");

    wf.request_evaluation(EvaluationRequest::new("- First.", ctx.clone()))
        .await?;
    wf.request_evaluation(EvaluationRequest::new("- Second.", ctx))
        .await?;

    let pending = wf.view_pending()?;
    assert_eq!(pending.statement, "- Second.");
    assert_eq!(pending.model_score, Some(9.0));

    wf.commit()?;
    assert_eq!(wf.store().len(), 1);
    assert!(matches!(wf.commit(), Err(EvalError::NothingToCommit)));
    Ok(())
}

#[tokio::test]
async fn upstream_failure_leaves_workflow_idle() -> anyhow::Result<()> {
    let (mut wf, client, ctx) = setup(Store::in_memory()?)?;
    client.push_response("ok\nTotal Score: 12/20");
    client.push_failure("connection reset");

    wf.request_evaluation(EvaluationRequest::new(STATEMENT, ctx.clone()))
        .await?;
    let err = wf
        .request_evaluation(EvaluationRequest::new(STATEMENT, ctx))
        .await
        .unwrap_err();

    assert!(matches!(err, EvalError::Upstream(_)));
    assert!(!wf.has_pending());
    assert_eq!(wf.store().len(), 0);
    Ok(())
}

#[tokio::test]
async fn blank_statement_never_reaches_client() -> anyhow::Result<()> {
    let (mut wf, client, ctx) = setup(Store::in_memory()?)?;
    let err = wf
        .request_evaluation(EvaluationRequest::new("   ", ctx))
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::InvalidConfiguration(_)));
    assert_eq!(client.calls(), 0);
    assert!(!wf.has_pending());
    Ok(())
}

#[tokio::test]
async fn committed_score_survives_reload() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("evals.db");

    {
        let (mut wf, client, ctx) = setup(Store::open(&path)?)?;
        client.push_response("...analysis...\nTotal Score: 14.5/20");
        wf.request_evaluation(EvaluationRequest::new(STATEMENT, ctx).with_predicted_score(13.0))
            .await?;
        wf.commit()?;
    }

    let table = Store::open(&path)?.load()?;
    assert_eq!(table.len(), 1);
    let rec = &table.records()[0];
    assert_eq!(rec.model_score, Some(14.5));
    assert_eq!(rec.reviewer_score, Some(13.0));
    assert_eq!(rec.statement, STATEMENT);
    assert_eq!(rec.tier.as_deref(), Some("NCO"));
    Ok(())
}

#[tokio::test]
async fn one_decimal_scores_reload_without_drift() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("evals.db");
    let scores = [13.3, 0.1, 19.9, 7.7];

    {
        let (mut wf, client, ctx) = setup(Store::open(&path)?)?;
        for score in scores {
            client.push_response(format!("analysis\nTotal Score: {}/20", score));
            wf.request_evaluation(
                EvaluationRequest::new(STATEMENT, ctx.clone()).with_predicted_score(score),
            )
            .await?;
            wf.commit()?;
        }
    }

    let table = Store::open(&path)?.load()?;
    let models: Vec<Option<f64>> = table.iter().map(|r| r.model_score).collect();
    let reviewers: Vec<Option<f64>> = table.iter().map(|r| r.reviewer_score).collect();
    let expected: Vec<Option<f64>> = scores.iter().copied().map(Some).collect();
    assert_eq!(models, expected);
    assert_eq!(reviewers, expected);
    Ok(())
}

#[tokio::test]
async fn workflows_coexist_on_one_store() -> anyhow::Result<()> {
    let store = Store::in_memory()?;
    let (mut a, client_a, ctx) = setup(store.clone())?;
    let (mut b, client_b, _) = setup(store.clone())?;
    client_a.push_response("a\nTotal Score: 1/20");
    client_b.push_response("b\nTotal Score: 2/20");

    a.request_evaluation(EvaluationRequest::new("- A.", ctx.clone()))
        .await?;
    b.request_evaluation(EvaluationRequest::new("- B.", ctx))
        .await?;
    b.commit()?;
    a.commit()?;

    let table = store.table();
    let scores: Vec<_> = table.iter().map(|r| r.model_score).collect();
    assert_eq!(scores, vec![Some(2.0), Some(1.0)]);
    Ok(())
}
