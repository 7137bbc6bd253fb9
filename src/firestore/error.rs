#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Random source unavailable: {0}")]
    Random(String),
}

impl StoreError {
    pub(crate) fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }

    /// Map a non-success REST status to the matching variant.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::PermissionDenied(body),
            404 => Self::NotFound(body),
            409 => Self::AlreadyExists(body),
            _ => Self::Http { status, body },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
