use thiserror::Error;

/// Errors that can abort a compilation run.
///
/// Per-line rule parse failures and per-slot intermediate skips are NOT modeled
/// here: those are warned and skipped inline, never propagated.
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("failed to read rules file {path}: {source}")]
    RulesUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings error: {0}")]
    Settings(String),

    #[error("failed to write report {path}: {source}")]
    ReportUnwritable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompilerError>;
