//! Fatal backend errors.
//!
//! These are failures of the *input contract* or of the backend itself (as opposed to degradations, which are
//! reported as [`crate::backend::Diagnostic`] values and never abort a unit).
//!
//! ## Notes
//!
//! - A `TranslateError` aborts the whole unit: partially written streams are discarded by the caller.
//! - Messages name the offending type or member so the upstream model can be fixed.

use thiserror::Error;

/// Error that aborts translation of a unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// The model broke a promise the backend relies on (dangling member reference, `base` without a base type,
    /// unbalanced context stack, ...). Not user-recoverable.
    #[error("internal defect while translating {context}: {detail}")]
    InternalDefect { context: String, detail: String },

    /// An emitted type names a base or interface that is neither in the unit nor in its references.
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

impl TranslateError {
    pub fn defect(context: impl Into<String>, detail: impl Into<String>) -> Self {
        TranslateError::InternalDefect {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Whether this error is an internal defect (exit code 2 in the CLI).
    pub fn is_internal_defect(&self) -> bool {
        matches!(self, TranslateError::InternalDefect { .. })
    }
}

/// Result alias used throughout the backend.
pub type TranslateResult<T> = Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TranslateError::defect("App.Widget::Run", "unbalanced cast-target stack (depth 1)");
        assert_eq!(
            err.to_string(),
            "internal defect while translating App.Widget::Run: unbalanced cast-target stack (depth 1)"
        );
        assert!(err.is_internal_defect());
        assert!(!TranslateError::InvalidModel("x".into()).is_internal_defect());
    }
}
