use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpsintError {
    #[error("Repository query failed: {0}")]
    RepositoryQuery(String),

    #[error("Failed to delete branch '{branch}': {message}")]
    BranchDeletion { branch: String, message: String },

    #[error("Invalid commit range: {0}")]
    RangeQuery(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("{service} error: {message}")]
    Service { service: String, message: String },

    #[error("No supported git service for {0}")]
    UnsupportedService(String),

    #[error("Invalid repository reference: {0}")]
    InvalidRepository(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UpsintError>;
