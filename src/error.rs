use thiserror::Error;

/// Unified error type for git-release operations
#[derive(Error, Debug)]
pub enum GitReleaseError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Version parsing error: {0}")]
    Parse(String),

    #[error("Manifest format error: {0}")]
    ManifestFormat(String),

    #[error("Tag already exists: {0}")]
    TagExists(String),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("Revision query failed: {0}")]
    RevisionQuery(String),

    #[error("History rewrite aborted: {0}")]
    RewriteAborted(String),

    #[error("Lock refresh failed: {0}")]
    Lock(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-release
pub type Result<T> = std::result::Result<T, GitReleaseError>;

impl GitReleaseError {
    /// Create a version parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        GitReleaseError::Parse(msg.into())
    }

    /// Create a manifest format error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        GitReleaseError::ManifestFormat(msg.into())
    }

    /// Create a tag-exists error for the given tag name
    pub fn tag_exists(name: impl Into<String>) -> Self {
        GitReleaseError::TagExists(name.into())
    }

    /// Create a tag-not-found error for the given tag name
    pub fn tag_not_found(name: impl Into<String>) -> Self {
        GitReleaseError::TagNotFound(name.into())
    }

    /// Create a revision query error with context
    pub fn revision(msg: impl Into<String>) -> Self {
        GitReleaseError::RevisionQuery(msg.into())
    }

    /// Create a history-rewrite error with context
    pub fn rewrite(msg: impl Into<String>) -> Self {
        GitReleaseError::RewriteAborted(msg.into())
    }

    /// Create a lock refresh error with context
    pub fn lock(msg: impl Into<String>) -> Self {
        GitReleaseError::Lock(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GitReleaseError::Config(msg.into())
    }
}
