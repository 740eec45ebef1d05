use thiserror::Error;

/// Problems with how restrictions are configured. These surface at startup,
/// while the schema registry is being built, and are never recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid restriction type: {0}")]
    UnknownCategory(String),

    #[error("columns cannot be registered under the \"all\" restriction")]
    CatchAllCategory,

    #[error("unknown content kind: {0}")]
    UnknownKind(String),

    #[error("invalid configuration file: {0}")]
    InvalidFile(String),
}

#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, BlueprintError>;
