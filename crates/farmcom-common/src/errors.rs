use std::path::PathBuf;

/// Configuration failures. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("invalid credential: environment variable {0} is empty")]
    InvalidCredential(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FarmcomError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("session error: {0}")]
    Session(String),
}
