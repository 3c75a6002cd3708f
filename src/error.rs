#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Schema Error: {0}")]
    Schema(String),
    #[error("Data Error: {0}")]
    Data(String),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest Error: {0}")]
    Manifest(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
