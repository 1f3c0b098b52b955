pub mod config;
pub mod context;
pub mod errors;
pub mod export;
pub mod model;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod redaction;
pub mod report;
pub mod storage;
pub mod workflow;

pub use errors::{EvalError, Result};
pub use workflow::Workflow;
