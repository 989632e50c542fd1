use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook read failed: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Source layout error: {0}")]
    Layout(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
