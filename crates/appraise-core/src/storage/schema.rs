pub const TABLE: &str = "evaluations";

/// Fixed column set of the evaluation table, in export order.
pub const COLUMNS: [&str; 10] = [
    "statement",
    "model_score",
    "reviewer_score",
    "justification",
    "award",
    "tier",
    "wing",
    "squadron",
    "reviewer_identity",
    "timestamp",
];

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS evaluations (
  statement TEXT NOT NULL,
  model_score REAL,
  reviewer_score REAL,
  justification TEXT,
  award TEXT NOT NULL,
  tier TEXT,
  wing TEXT,
  squadron TEXT,
  reviewer_identity TEXT,
  timestamp TEXT NOT NULL
);
"#;

/// Compares a found column set against [`COLUMNS`], ignoring order.
pub fn check_columns(found: &[String]) -> Result<(), String> {
    let mut expected: Vec<&str> = COLUMNS.to_vec();
    let mut actual: Vec<&str> = found.iter().map(String::as_str).collect();
    expected.sort_unstable();
    actual.sort_unstable();
    if expected == actual {
        return Ok(());
    }

    let missing: Vec<&str> = expected
        .iter()
        .filter(|c| !actual.contains(c))
        .copied()
        .collect();
    let unexpected: Vec<&str> = actual
        .iter()
        .filter(|c| !expected.contains(c))
        .copied()
        .collect();
    Err(format!(
        "column set mismatch (missing: {:?}, unexpected: {:?})",
        missing, unexpected
    ))
}
