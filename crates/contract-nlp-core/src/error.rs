use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid validation pattern for {attribute}: {source}")]
    InvalidPattern {
        attribute: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("{0}")]
    Other(String),
}

/// A user-supplied value rejected by an attribute's rules.
///
/// `message` is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationFailure {
    pub attribute: String,
    pub message: String,
}
