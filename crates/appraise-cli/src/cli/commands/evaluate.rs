use super::exit_codes;
use super::{load_config_or_default, open_store};
use crate::cli::args::EvaluateArgs;
use appraise_core::config::{AppraiseConfig, Provider};
use appraise_core::context::ContextKeys;
use appraise_core::model::EvaluationRequest;
use appraise_core::providers::llm::fake::FakeClient;
use appraise_core::providers::llm::openai::OpenAIClient;
use appraise_core::providers::llm::CompletionClient;
use appraise_core::report::console;
use appraise_core::{EvalError, Workflow};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

enum Decision {
    Accept,
    Retry,
    Cancel,
}

pub async fn cmd_evaluate(args: EvaluateArgs) -> anyhow::Result<i32> {
    if args.review && args.statement.is_none() {
        anyhow::bail!("--review needs --statement (stdin is used for the review prompt)");
    }

    let cfg = load_config_or_default(&args.config)?;
    let catalog = cfg.load_catalog()?;
    let keys = cfg.defaults.merged(&ContextKeys {
        award: args.award.clone().unwrap_or_default(),
        tier: args.tier.clone(),
        wing: args.wing.clone(),
        squadron: args.squadron.clone(),
    });
    let grading_context = catalog.context(&keys)?;

    let statement = match &args.statement {
        Some(s) => s.clone(),
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let client = build_client(&cfg)?;
    let store = open_store(&cfg, args.store.as_ref())?;
    let mut workflow = Workflow::from_catalog(&catalog, client, store).with_redaction(cfg.redaction());

    let mut request = EvaluationRequest::new(statement, grading_context);
    if let Some(id) = &args.reviewer {
        request = request.with_reviewer(id.clone());
    }
    if let Some(score) = args.predicted_score {
        request = request.with_predicted_score(score);
    }

    let pending = workflow.request_evaluation(request.clone()).await?;
    console::print_pending(&pending);

    if !args.review {
        if !workflow.is_valid_pending() {
            eprintln!("no total score found in the model response; nothing recorded");
            workflow.cancel()?;
            return Ok(exit_codes::NOT_COMMITTED);
        }
        return commit(&mut workflow);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let valid = workflow.is_valid_pending();
        if valid {
            eprint!("[a]ccept, [r]etry or [c]ancel? ");
        } else {
            eprint!("no score to accept. [r]etry or [c]ancel? ");
        }

        let answer = lines.next_line().await?.unwrap_or_default();
        let decision = match answer.trim().to_ascii_lowercase().as_str() {
            "a" | "accept" if valid => Decision::Accept,
            "a" | "accept" => {
                eprintln!("cannot accept: the response has no total score");
                continue;
            }
            "r" | "retry" => Decision::Retry,
            "c" | "cancel" | "" => Decision::Cancel,
            other => {
                eprintln!("unrecognised answer {:?}", other);
                continue;
            }
        };

        match decision {
            Decision::Accept => return commit(&mut workflow),
            Decision::Cancel => {
                workflow.cancel()?;
                eprintln!("cancelled; nothing recorded");
                return Ok(exit_codes::NOT_COMMITTED);
            }
            Decision::Retry => {
                let pending = workflow.request_evaluation(request.clone()).await?;
                console::print_pending(&pending);
            }
        }
    }
}

fn commit(workflow: &mut Workflow) -> anyhow::Result<i32> {
    match workflow.commit() {
        Ok(record) => {
            console::print_committed(&record, workflow.store().len());
            Ok(exit_codes::OK)
        }
        Err(EvalError::Persistence(msg)) => {
            eprintln!("warning: write failed ({}); retrying once", msg);
            workflow.retry_persist()?;
            let table = workflow.store().table();
            if let Some(record) = table.last() {
                console::print_committed(record, table.len());
            }
            Ok(exit_codes::OK)
        }
        Err(e) => Err(e.into()),
    }
}

fn build_client(cfg: &AppraiseConfig) -> anyhow::Result<Arc<dyn CompletionClient>> {
    let completion = cfg
        .model
        .completion_config(|name| std::env::var(name).ok())?;
    let client: Arc<dyn CompletionClient> = match cfg.model.provider {
        Provider::Openai => Arc::new(OpenAIClient::new(completion)?),
        Provider::Fake => {
            let fake = FakeClient::new(completion.model);
            for reply in &cfg.model.fake_responses {
                fake.push_response(reply.clone());
            }
            Arc::new(fake)
        }
    };
    Ok(client)
}
