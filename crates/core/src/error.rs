use thiserror::Error;

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("request validation error: {0}")]
    Validation(String),

    #[error("causal analysis error: {0}")]
    Causal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
