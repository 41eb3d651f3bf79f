//! Error handling for the wildcards backend.

pub mod domain;

pub use domain::{ConflictKind, DomainError, ExhaustedKind, NotFoundKind};
