use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{service} error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("Path error: {0}")]
    Path(String),

    #[error("Disk probe error: {0}")]
    DiskProbe(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Error::Service {
            service,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
