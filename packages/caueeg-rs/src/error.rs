use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaueegError {
    #[error("Source directory not found: {0}")]
    SourceNotFound(String),

    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid EDF header in {path}: {reason}")]
    InvalidEdfHeader { path: String, reason: String },

    #[error("Unresolvable channel name '{channel}' in {path}")]
    UnresolvedChannel { path: String, channel: String },

    #[error("Participant table conflict for '{serial}': {reason}")]
    MergeConflict { serial: String, reason: String },

    #[error("Malformed event file {path}: {reason}")]
    MalformedEvents { path: String, reason: String },

    #[error("Conversion failed: {0}")]
    ExecutionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, CaueegError>;
