use crate::model::{EvaluationRecord, PendingEvaluation};
use std::io::{self, Write};

pub fn print_pending(pending: &PendingEvaluation) {
    let _ = write_pending(&mut io::stderr(), pending);
}

pub fn write_pending<W: Write>(w: &mut W, pending: &PendingEvaluation) -> io::Result<()> {
    let ctx = &pending.grading_context;
    writeln!(w, "Statement: {}", pending.statement.trim())?;
    writeln!(
        w,
        "Context: award={} tier={} wing={} squadron={}",
        ctx.award.key,
        ctx.tier.as_ref().map(|c| c.key.as_str()).unwrap_or("-"),
        ctx.wing_priorities.as_ref().map(|c| c.key.as_str()).unwrap_or("-"),
        ctx.squadron_priorities
            .as_ref()
            .map(|c| c.key.as_str())
            .unwrap_or("-"),
    )?;
    match pending.model_score {
        Some(score) => writeln!(w, "Model score: {}/20", score)?,
        None => writeln!(w, "Model score: none (response did not contain a total score)")?,
    }
    if let Some(score) = pending.reviewer_score {
        writeln!(w, "Reviewer prediction: {}/20", score)?;
    }
    match &pending.justification {
        Some(j) => writeln!(w, "Justification:\n{}", j)?,
        None => writeln!(w, "Raw response:\n{}", pending.raw_response.trim())?,
    }
    Ok(())
}

pub fn print_committed(record: &EvaluationRecord, rows: usize) {
    eprintln!(
        "Committed row {} (score={}) - table now has {} rows",
        record.position,
        record
            .model_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into()),
        rows
    );
}
