//! Error taxonomy for caller-facing operations.

use uuid::Uuid;

use crate::generation::{GenerationError, MalformedOutput, TemplateError};

/// Errors returned by every [`crate::TripService`] operation.
///
/// No variant is retried inside the core; retry policy belongs to callers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Empty or malformed caller-supplied text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("no plan found for session {0}")]
    PlanNotFound(Uuid),

    /// The options stage of this session has already been closed.
    #[error("session {0} is finished and accepts no further options")]
    SessionFinished(Uuid),

    /// Neither the hinted nor the widened catalog query returned a place.
    #[error("no candidate places available for recommendation")]
    NoCandidates,

    #[error(transparent)]
    MalformedGenerationOutput(#[from] MalformedOutput),

    /// A prompt template was misused (missing variable, bad syntax).
    #[error(transparent)]
    Prompt(#[from] TemplateError),

    /// The generation backend itself failed (transport or API error).
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
