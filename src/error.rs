use thiserror::Error;

/// Conditions that abort a run. No partial report is ever printed after one of these.
#[derive(Debug, Error)]
pub enum DepsError {
    #[error("Missing package for \"{id}\"")]
    MissingPackage { id: String },

    #[error("Unsupported report: \"{0}\"")]
    UnsupportedReport(String),

    #[error("Failed to read the dependency tree: {0}")]
    TreeCommand(String),
}
