//! Domain-level error type used across the session coordinator.
//!
//! This error type is transport-agnostic. Coordinator operations return
//! `Result<T, DomainError>`; the dispatcher logs and absorbs them so that no
//! action-level failure ever escapes a running game. Edges that talk to the
//! outside world convert into `crate::error::AppError`.

use thiserror::Error;

/// Domain-level not found entities
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Game,
    Language,
    Seat,
    Other(String),
}

/// Domain-level conflict kinds
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    GameFull,
    AlreadyRunning,
    NotRunning,
    PhaseResolved,
    Other(String),
}

/// Which pool of a deck ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedKind {
    Prompts,
    Answers,
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Malformed input or business rule violation
    #[error("validation error: {0}")]
    Validation(String),
    /// Caller is not allowed to perform the action (not host, not judge, ...)
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Semantic conflict with the current state
    #[error("conflict {0:?}: {1}")]
    Conflict(ConflictKind, String),
    /// Missing resource in domain terms
    #[error("not found {0:?}: {1}")]
    NotFound(NotFoundKind, String),
    /// A deck pool ran out of cards
    #[error("exhausted {0:?}: {1}")]
    Exhausted(ExhaustedKind, String),
    /// Structural invariant violated; should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn exhausted(kind: ExhaustedKind, detail: impl Into<String>) -> Self {
        Self::Exhausted(kind, detail.into())
    }
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Errors that indicate a bug rather than a misbehaving client.
    pub fn is_internal(&self) -> bool {
        matches!(self, DomainError::Internal(_))
    }
}
