use thiserror::Error;

/// Rejected morph requests. These are caller bugs, not runtime conditions.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MorphError {
    #[error("target must have exactly one more anchor than source ({from} -> {to})")]
    SideCountMismatch { from: usize, to: usize },

    #[error("morph needs at least 3 source anchors, got {0}")]
    TooFewAnchors(usize),

    #[error("a morph is already in flight")]
    AlreadyActive,

    #[error("duration must be positive, got {0}")]
    InvalidDuration(f64),
}

/// Golden snapshot persistence and lookup failures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("golden snapshot {0:?} not found")]
    NotFound(String),

    #[error("snapshot storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid parameter: {0}")]
    Invalid(String),
}
