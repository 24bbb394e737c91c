use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolybotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Secret file {path}: {source}")]
    Secret {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PolybotError {
    /// Short error code for logs and health output.
    pub fn code(&self) -> &'static str {
        match self {
            PolybotError::Config(_) => "CONFIG_ERROR",
            PolybotError::Secret { .. } => "SECRET_ERROR",
            PolybotError::Serialization(_) => "SERIALIZATION_ERROR",
            PolybotError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PolybotError>;
