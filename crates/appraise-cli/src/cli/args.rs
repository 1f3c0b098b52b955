use appraise_core::export::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "appraise",
    version,
    about = "LLM-graded evaluation of performance statements"
)]
pub struct Cli {
    /// emit JSON log lines on stderr (filter with APPRAISE_LOG)
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// write a sample appraise.yaml
    Init(InitArgs),
    /// grade one statement, review it, and record it
    Evaluate(EvaluateArgs),
    /// dump the evaluation table as xlsx, csv or tsv
    Export(ExportArgs),
    /// list the category keys the catalog knows
    Categories(CategoriesArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "appraise.yaml")]
    pub config: PathBuf,

    /// generate .gitignore for the evaluation store
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(Parser, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "appraise.yaml", env = "APPRAISE_CONFIG")]
    pub config: PathBuf,

    /// overrides `store` from the config
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// statement text; read from stdin when omitted
    #[arg(long, short = 's', allow_hyphen_values = true)]
    pub statement: Option<String>,

    #[arg(long)]
    pub award: Option<String>,

    /// rank tier key, or N/A
    #[arg(long)]
    pub tier: Option<String>,

    /// wing priorities key, or N/A
    #[arg(long)]
    pub wing: Option<String>,

    /// squadron priorities key, or N/A
    #[arg(long)]
    pub squadron: Option<String>,

    #[arg(long, env = "APPRAISE_REVIEWER")]
    pub reviewer: Option<String>,

    /// the reviewer's own expected score out of 20
    #[arg(long)]
    pub predicted_score: Option<f64>,

    /// ask before committing instead of committing every scored result
    #[arg(long)]
    pub review: bool,
}

#[derive(Parser, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = "appraise.yaml", env = "APPRAISE_CONFIG")]
    pub config: PathBuf,

    #[arg(long)]
    pub store: Option<PathBuf>,

    /// xlsx | csv | tsv (excel is accepted for xlsx)
    #[arg(long, default_value = "xlsx")]
    pub format: ExportFormat,

    /// defaults to evaluations.<format>
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct CategoriesArgs {
    #[arg(long, default_value = "appraise.yaml", env = "APPRAISE_CONFIG")]
    pub config: PathBuf,

    /// only this kind: award | tier | wing | squadron
    #[arg(long)]
    pub kind: Option<String>,
}
