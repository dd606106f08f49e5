//! # DomainError
//!
//! Centralized error handling for the stories domain.
//! Expected conditions (nothing to show, missing records) are ordinary variants
//! so callers can branch on them instead of treating them as failures.

use thiserror::Error;

use crate::models::{StoryId, UserId};

/// The primary error type for all domain and port operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No active stories to hand to a viewer; the caller must not open a session.
    #[error("no active stories to show")]
    EmptyStorySet,

    /// Repository lookup miss
    #[error("story {0} not found")]
    StoryNotFound(StoryId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Media for the current story could not be loaded. Never fatal.
    #[error("media failed to load: {0}")]
    MediaLoadFailure(String),

    /// Validation failure (e.g. unsupported media type, caption too long)
    #[error("validation error: {0}")]
    Validation(String),

    /// Infrastructure failure in a collaborator (storage, transport).
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    /// True for the "nothing to show / skip" family that callers handle
    /// by closing or not opening a viewer rather than reporting an error.
    pub fn is_skip_signal(&self) -> bool {
        matches!(self, Self::EmptyStorySet | Self::StoryNotFound(_))
    }
}

/// A specialized Result type for domain logic.
pub type DomainResult<T> = std::result::Result<T, DomainError>;
