use thiserror::Error;

/// All errors produced by voxorder-core.
#[derive(Debug, Error)]
pub enum VoxorderError {
    #[error("no status keyword followed any identifier")]
    NoGroupsRecognized,

    #[error("order not found: {id}")]
    IdentifierUnresolved { id: String },

    #[error("order id is required")]
    MissingOrderId,

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("session is not listening")]
    NotListening,

    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VoxorderError>;
