#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    InvalidState(String),
    Storage(String),
}

impl EngineError {
    /// HTTP-equivalent code, recorded in audit entries and used by the edge.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Validation(_) | EngineError::InvalidState(_) => 400,
            EngineError::NotFound(_) => 404,
            EngineError::Conflict(_) => 409,
            EngineError::Storage(_) => 500,
        }
    }

    pub(crate) fn storage(e: std::io::Error) -> Self {
        EngineError::Storage(e.to_string())
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation failed: {msg}"),
            EngineError::NotFound(what) => write!(f, "not found: {what}"),
            EngineError::Conflict(msg) => write!(f, "conflict: {msg}"),
            EngineError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
