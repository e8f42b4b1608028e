//! Error types for the profile module.

use thiserror::Error;

use crate::wizard::WizardStep;

/// Result type alias for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while building or storing profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot leave {step}: {have} photo(s) uploaded, at least {need} required")]
    NotEnoughPhotos {
        step: WizardStep,
        have: usize,
        need: usize,
    },

    #[error("Invalid gender: {0} (expected male or female)")]
    InvalidGender(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProfileError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
