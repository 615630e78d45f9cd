use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WellcatError {
    #[error("failed to load category table from {path}: {reason}")]
    TableLoad { path: PathBuf, reason: String },

    #[error("invalid category table row at line {line}: {reason}")]
    TableRow { line: u64, reason: String },

    #[error("conflicting categories for key {key} (line {line}): '{first}' vs '{second}'")]
    ConflictingKey {
        key: String,
        first: String,
        second: String,
        line: u64,
    },

    #[error("failed to load database config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid database config: {0}")]
    ConfigInvalid(String),

    #[error("unknown database '{name}'. Available: {available}")]
    UnknownDatabase { name: String, available: String },

    #[error("well '{well_id}' reached routing with an unresolved discrepancy category")]
    UnresolvedDiscrepancy { well_id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
