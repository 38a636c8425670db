//! Error taxonomy for the orchestration engine.

use crate::domain::{AgentKind, ShipmentStatus};

/// Failure of an external stage function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    #[error("stage backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid stage input: {0}")]
    InvalidInput(String),

    #[error("stage failed: {0}")]
    Internal(String),
}

/// An observer refused an update.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObserverError {
    #[error("observer rejected update: {0}")]
    Rejected(String),
}

/// Errors produced by a shipment run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("stage {stage} failed: {source}")]
    StageFailed {
        stage: AgentKind,
        #[source]
        source: StageError,
    },

    #[error("observer error: {0}")]
    Observer(#[from] ObserverError),

    #[error("shipment {shipment_id} is already finalized as {status}")]
    AlreadyFinalized {
        shipment_id: String,
        status: ShipmentStatus,
    },
}

/// Result type for orchestration operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Result type returned by stage functions.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Result type returned by observer callbacks.
pub type ObserverResult = std::result::Result<(), ObserverError>;
