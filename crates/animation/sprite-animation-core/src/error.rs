//! Error types for sprite slicing and playback

use serde::{Deserialize, Serialize};

/// Errors surfaced by atlas lookups, sequences and the playback handler.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SpriteError {
    /// No animation registered under this name
    #[error("Animation not found: {name}")]
    NotFound { name: String },

    /// An animation with this name is already registered
    #[error("Animation already registered: {name}")]
    DuplicateName { name: String },

    /// Sequence cursor does not address a frame
    #[error("Frame index {index} is out of range for sequence '{sequence}' ({len} frames)")]
    IndexOutOfRange {
        sequence: String,
        index: usize,
        len: usize,
    },

    /// Cell coordinate lies outside the atlas grid
    #[error("Cell ({col}, {row}) is outside the {columns}x{rows} atlas grid")]
    CellOutOfRange {
        col: u32,
        row: u32,
        columns: u32,
        rows: u32,
    },

    /// Zero scale, zero cell size, empty frame list, bad step and similar
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Sheet definition could not be parsed
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl SpriteError {
    /// Shorthand for [`SpriteError::InvalidArgument`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`SpriteError::NotFound`].
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Check if the caller can keep ticking after this error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::DuplicateName { .. }
                | Self::IndexOutOfRange { .. }
                | Self::CellOutOfRange { .. }
                | Self::InvalidArgument { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } | Self::DuplicateName { .. } => "library",
            Self::IndexOutOfRange { .. } | Self::CellOutOfRange { .. } => "range",
            Self::InvalidArgument { .. } => "validation",
            Self::SerializationError { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for SpriteError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let missing = SpriteError::not_found("walk");
        assert_eq!(missing.category(), "library");

        let cell = SpriteError::CellOutOfRange {
            col: 9,
            row: 0,
            columns: 4,
            rows: 1,
        };
        assert_eq!(cell.category(), "range");
        assert_eq!(SpriteError::invalid("scale").category(), "validation");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(SpriteError::DuplicateName {
            name: "idle".to_string()
        }
        .is_recoverable());

        let parse = SpriteError::SerializationError {
            reason: "eof".to_string(),
        };
        assert!(!parse.is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = SpriteError::IndexOutOfRange {
            sequence: "run".to_string(),
            index: 7,
            len: 4,
        };
        assert_eq!(
            err.to_string(),
            "Frame index 7 is out of range for sequence 'run' (4 frames)"
        );
    }

    #[test]
    fn test_serialization() {
        let error = SpriteError::not_found("jump");
        let serialized = serde_json::to_string(&error).unwrap();
        let deserialized: SpriteError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(error, deserialized);
    }
}
