//! Error types for the Roomcraft workflow.

use thiserror::Error;

use crate::design::Stage;
use crate::transform::TransformFailure;

/// A shared error type for the entire Roomcraft workspace.
///
/// Validation variants describe caller mistakes against the workflow's
/// preconditions and are never retried. `TransformFailed` wraps a decoded
/// provider failure. Persistence problems never appear here at the workflow
/// level; the design store absorbs them.
#[derive(Error, Debug, Clone)]
pub enum RoomcraftError {
    /// The requested action is not allowed in the current stage, or another
    /// transformation call is still outstanding.
    #[error("Invalid transition: cannot {action} while in {stage} stage ({reason})")]
    InvalidTransition {
        stage: Stage,
        action: &'static str,
        reason: String,
    },

    /// No selected item carries a non-empty placement instruction.
    #[error("Select at least one item and describe where it should go")]
    EmptySelection,

    /// The item id is not in the catalog or not part of the selection.
    #[error("Unknown item: '{0}'")]
    UnknownItem(String),

    /// No provider credential has been stored yet.
    #[error("No API credential configured")]
    MissingCredential,

    /// A credential consisting only of whitespace was rejected.
    #[error("API credential must not be empty")]
    EmptyCredential,

    /// The image provider returned a non-success outcome.
    #[error("Image transformation failed: {0}")]
    TransformFailed(TransformFailure),

    /// Decoding or normalizing an input image failed.
    #[error("Could not process image: {0}")]
    ImageProcessing(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoomcraftError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidTransition error
    pub fn invalid_transition(stage: Stage, action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            stage,
            action,
            reason: reason.into(),
        }
    }

    /// Creates an ImageProcessing error
    pub fn image_processing(message: impl Into<String>) -> Self {
        Self::ImageProcessing(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidTransition error
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// Check if this is an EmptySelection error
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, Self::EmptySelection)
    }

    /// Check if this error comes from the caller rather than the provider or
    /// the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::EmptySelection
                | Self::UnknownItem(_)
                | Self::MissingCredential
                | Self::EmptyCredential
        )
    }

    /// Returns the provider failure when this is a transformation error.
    pub fn transform_failure(&self) -> Option<&TransformFailure> {
        match self {
            Self::TransformFailed(failure) => Some(failure),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RoomcraftError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RoomcraftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RoomcraftError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for RoomcraftError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<TransformFailure> for RoomcraftError {
    fn from(failure: TransformFailure) -> Self {
        Self::TransformFailed(failure)
    }
}

/// A type alias for `Result<T, RoomcraftError>`.
pub type Result<T> = std::result::Result<T, RoomcraftError>;
