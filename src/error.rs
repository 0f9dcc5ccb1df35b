use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Io Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config Parse Error: {0}")]
    ConfigParseError(#[from] serde_json::Error),

    #[error("Invalid Config: {0}")]
    InvalidConfig(String),

    #[error("Unknown Source: {0}")]
    UnknownSource(String),
}
