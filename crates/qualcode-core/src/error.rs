//! Error taxonomy for the tagging engine.
//!
//! Every failure is local and recoverable. A failed operation leaves the
//! engine exactly as it was before the call.

use thiserror::Error;

/// Coarse classification used by callers that map errors onto a surface
/// (HTTP status, CLI exit message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed (e.g. a blank label name).
    InvalidInput,
    /// The request refers to a document or label that does not exist.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("label name must not be empty")]
    EmptyLabel,

    #[error("invalid label name {name:?}: must not contain ',' or line breaks")]
    MalformedLabel { name: String },

    #[error("document not found: {id} (valid ids are 1..={count})")]
    UnknownDocument { id: usize, count: usize },

    #[error("label not found: {name:?}")]
    UnknownLabel { name: String },
}

impl TagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TagError::EmptyLabel | TagError::MalformedLabel { .. } => ErrorKind::InvalidInput,
            TagError::UnknownDocument { .. } | TagError::UnknownLabel { .. } => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(TagError::EmptyLabel.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            TagError::MalformedLabel { name: "a,b".into() }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            TagError::UnknownDocument { id: 9, count: 3 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TagError::UnknownLabel { name: "x".into() }.kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_messages() {
        let e = TagError::UnknownDocument { id: 9, count: 3 };
        assert_eq!(e.to_string(), "document not found: 9 (valid ids are 1..=3)");
        let e = TagError::UnknownLabel { name: "urgent".into() };
        assert!(e.to_string().contains("not found"));
    }
}
