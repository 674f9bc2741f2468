pub type HarnessResult<T> = Result<T, HarnessError>;

/// Failures of the remote blob/record stores and the local flag store
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("no live render surface to capture from")]
    NoSurface,

    #[error("a capture session is already in progress")]
    SessionBusy,

    #[error("capture produced no data")]
    EmptyCapture,

    #[error("render surface was disposed during capture")]
    SurfaceLost,

    #[error("encode error: {0}")]
    Encode(String),

    #[error("upload failed: {0}")]
    Upload(#[source] StoreError),

    #[error("saving submission failed: {0}")]
    Persist(#[source] StoreError),

    #[error("loading submissions failed: {0}")]
    Fetch(#[source] StoreError),

    #[error("casting vote failed: {0}")]
    Vote(#[source] StoreError),

    #[error("this client has already voted")]
    AlreadyVoted,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("definition error: {0}")]
    Definition(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors the user can recover from by restarting the submission flow
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(HarnessError::contract("x")
            .to_string()
            .contains("contract violation:"));
        assert!(HarnessError::validation("x")
            .to_string()
            .contains("validation error:"));
        assert!(HarnessError::Upload(StoreError::unavailable("down"))
            .to_string()
            .starts_with("upload failed: service unavailable: down"));
        assert!(HarnessError::Persist(StoreError::unavailable("down"))
            .to_string()
            .starts_with("saving submission failed:"));
    }

    #[test]
    fn store_errors_keep_their_source() {
        use std::error::Error as _;

        let err = HarnessError::Persist(StoreError::not_found("submissions"));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("not found: submissions"));
    }

    #[test]
    fn capture_errors_are_recoverable() {
        assert!(HarnessError::NoSurface.is_recoverable());
        assert!(HarnessError::SessionBusy.is_recoverable());
        assert!(!HarnessError::config("bad").is_recoverable());
    }
}
