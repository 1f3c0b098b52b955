use super::args::*;
use appraise_core::config::{AppraiseConfig, DEFAULT_CONFIG_FILE};
use appraise_core::context::{CategoryKind, GradingCatalog};
use appraise_core::storage::Store;
use appraise_core::EvalError;
use std::path::{Path, PathBuf};

pub mod evaluate;
pub mod export;

pub mod exit_codes {
    pub const OK: i32 = 0;
    /// The evaluation was cancelled or could not be committed.
    pub const NOT_COMMITTED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Evaluate(args) => evaluate::cmd_evaluate(args).await,
        Command::Export(args) => export::cmd_export(args),
        Command::Categories(args) => cmd_categories(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Exit code for a command that failed with `err`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EvalError>() {
        Some(
            EvalError::Upstream(_)
            | EvalError::Persistence(_)
            | EvalError::InvalidState(_)
            | EvalError::NothingToCommit
            | EvalError::NoPendingEvaluation,
        ) => exit_codes::NOT_COMMITTED,
        _ => exit_codes::CONFIG_ERROR,
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if let Some(parent) = args.config.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if appraise_core::config::write_sample_config(&args.config)? {
        eprintln!("created {}", args.config.display());
    } else {
        eprintln!("note: {} already exists", args.config.display());
    }

    if args.gitignore {
        write_file_if_missing(Path::new(".gitignore"), crate::templates::GITIGNORE)?;
    }
    Ok(exit_codes::OK)
}

fn cmd_categories(args: CategoriesArgs) -> anyhow::Result<i32> {
    let cfg = load_config_or_default(&args.config)?;
    let catalog = cfg.load_catalog()?;

    let kinds: Vec<CategoryKind> = match args.kind.as_deref() {
        None => CategoryKind::ALL.to_vec(),
        Some(k) => match CategoryKind::ALL.iter().find(|c| c.as_str() == k) {
            Some(kind) => vec![*kind],
            None => {
                eprintln!("unknown category kind {:?} (award|tier|wing|squadron)", k);
                return Ok(exit_codes::CONFIG_ERROR);
            }
        },
    };
    print_categories(&catalog, &kinds);
    Ok(exit_codes::OK)
}

fn print_categories(catalog: &GradingCatalog, kinds: &[CategoryKind]) {
    for kind in kinds {
        println!("{}:", kind);
        for key in catalog.keys(*kind) {
            println!("  {}", key);
        }
    }
}

/// Loads `path`, falling back to built-in defaults when the default config
/// file is simply absent.
pub(crate) fn load_config_or_default(path: &Path) -> anyhow::Result<AppraiseConfig> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
        tracing::debug!(event = "config_defaulted", path = %path.display());
        return Ok(AppraiseConfig::default());
    }
    Ok(appraise_core::config::load_config(path)?)
}

pub(crate) fn open_store(cfg: &AppraiseConfig, override_path: Option<&PathBuf>) -> anyhow::Result<Store> {
    let path = override_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from(&cfg.store));
    Ok(Store::open(&path)?)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}
