use thiserror::Error;

pub type LiftResult<T> = Result<T, LiftError>;

#[derive(Error, Debug)]
pub enum LiftError {
    #[error("Schema error in {file}: missing required column '{column}'")]
    Schema { file: String, column: String },

    #[error("Malformed value in {file} row {row}: {message}")]
    Malformed {
        file: String,
        row: usize,
        message: String,
    },

    #[error("Degenerate split: {0}")]
    DegenerateSplit(String),

    #[error("AUC undefined: {0}")]
    UndefinedMetric(String),

    #[error("Feature alignment error: {0}")]
    FeatureMismatch(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
