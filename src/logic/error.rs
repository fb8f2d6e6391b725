//! Error handling
//!
//! One error family per pipeline stage, folded into [`PipelineError`].
//! Data and selection errors abort before training, model errors are raised
//! where shapes are fixed, transport errors are contained by the dispatcher.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("feature selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ============================================================================
// DATA
// ============================================================================

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no header row")]
    MissingHeader,

    #[error("need at least one feature column and a label column, found {0} columns")]
    TooFewColumns(usize),

    #[error("dataset contains no data rows")]
    Empty,

    #[error("row {row} has {found} fields, header has {expected}")]
    RowWidth { row: usize, expected: usize, found: usize },

    #[error("column '{0}' has no numeric values")]
    EmptyColumn(String),

    #[error("row {row} has an empty label")]
    EmptyLabel { row: usize },

    #[error("row index {index} out of range ({rows} rows)")]
    RowOutOfRange { index: usize, rows: usize },

    #[error("label '{0}' was not seen when the encoder was fit")]
    UnknownLabel(String),

    #[error("expected {expected} label classes, found {}: {classes:?}", .classes.len())]
    ClassCount { expected: usize, classes: Vec<String> },

    #[error("label {label} outside [0, {classes})")]
    LabelOutOfRange { label: usize, classes: usize },

    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("split fraction {0} must be strictly between 0 and 1")]
    InvalidFraction(f64),

    #[error("split leaves the {0} partition empty")]
    EmptyPartition(&'static str),
}

// ============================================================================
// FEATURE SELECTION
// ============================================================================

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("top-k must be at least 1")]
    ZeroTopK,

    #[error("dataset has no feature columns to score")]
    NoColumns,

    #[error("no feature among the top {candidates} scored at least {min_score}")]
    Empty { candidates: usize, min_score: f64 },
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{context}: expected width {expected}, got {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("invalid training setting: {0}")]
    InvalidTraining(String),

    #[error("artifact I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("unsupported artifact format version {0}")]
    UnsupportedVersion(u32),

    #[error("weights checksum mismatch: manifest {expected}, computed {actual}")]
    Checksum { expected: String, actual: String },
}

impl ModelError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ============================================================================
// TRANSPORT
// ============================================================================

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{channel} endpoint returned HTTP {code}: {body}")]
    Status {
        channel: String,
        code: u16,
        body: String,
    },

    #[error("{channel} request failed: {message}")]
    Http { channel: String, message: String },

    #[error("SMTP failure: {message}")]
    Smtp { message: String, transient: bool },

    #[error("invalid address: {0}")]
    Address(String),

    #[error("cannot build message: {0}")]
    Message(String),
}

impl TransportError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status { code, .. } => *code >= 500 || *code == 429,
            TransportError::Http { .. } => true,
            TransportError::Smtp { transient, .. } => *transient,
            TransportError::Address(_) | TransportError::Message(_) => false,
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}={value}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{channel} alerts partially configured, missing {missing:?}")]
    Incomplete {
        channel: &'static str,
        missing: Vec<&'static str>,
    },
}
