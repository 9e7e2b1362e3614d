use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScmTreeError>;

#[derive(Debug, Error)]
pub enum ScmTreeError {
    #[error("Git error: {0}")]
    Git(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not open {uri}: {reason}")]
    Open { uri: String, reason: String },
    #[error("Unknown command: {0}")]
    Command(String),
    #[error("Error: {0}")]
    Generic(String),
}

impl From<gix::discover::Error> for ScmTreeError {
    fn from(error: gix::discover::Error) -> Self {
        ScmTreeError::Git(error.to_string())
    }
}

impl From<String> for ScmTreeError {
    fn from(error: String) -> Self {
        ScmTreeError::Generic(error)
    }
}

impl From<&str> for ScmTreeError {
    fn from(error: &str) -> Self {
        ScmTreeError::Generic(error.to_string())
    }
}
