use thiserror::Error;

pub type PromoResult<T> = Result<T, PromoError>;

#[derive(Error, Debug)]
pub enum PromoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Form edit error: {0}")]
    Edit(String),

    #[error("Draft storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for PromoError {
    fn from(err: config::ConfigError) -> Self {
        PromoError::Config(err.to_string())
    }
}
