//! Error types for expression compilation and catalog loading.
//!
//! Formula problems are reported as [`ExprError`]; everything that can go
//! wrong while turning documents into catalog objects is a [`LoadError`].
//! Loading never treats a `LoadError` as fatal: the loader logs the error
//! and skips the offending document.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while compiling a formula string.
///
/// Evaluation itself cannot fail (missing variables read as `0.0` and
/// division by zero follows IEEE semantics), so every error here is caught
/// at compile time.
///
/// # Examples
///
/// ```rust
/// use gearcalc::expr::compile;
/// use gearcalc::ExprError;
///
/// assert!(matches!(compile("(2 + 3"), Err(ExprError::UnbalancedParens)));
/// assert!(matches!(compile("2 +"), Err(ExprError::Malformed(_))));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// The formula contained no tokens at all.
    #[error("empty expression")]
    Empty,

    /// A parenthesis was opened but never closed, or closed but never opened.
    #[error("unbalanced parentheses")]
    UnbalancedParens,

    /// The token sequence does not form a valid expression, e.g. a trailing
    /// operator or two operands with nothing between them.
    #[error("malformed expression: {0}")]
    Malformed(String),

    /// A character that is not part of the formula grammar.
    #[error("unexpected character {0:?} in expression")]
    UnexpectedChar(char),
}

/// Errors produced while loading documents into catalog objects.
///
/// The loaders recover from all of these by skipping the single document
/// (or the single candidate world directory) involved; the worst outcome of
/// a bad document is an incomplete catalog.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A file was not valid JSON.
    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    /// A field the document shape requires was absent.
    #[error("missing required field `{0}`")]
    MissingField(String),

    /// A field was present but had the wrong type.
    #[error("field `{field}` should be {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    /// A document referenced a catalog id that does not exist.
    #[error("unresolved catalog id `{0}`")]
    UnresolvedId(String),

    /// An embedded formula failed to compile.
    #[error("expression error: {0}")]
    Expr(#[from] ExprError),

    /// A loader was pointed at something that is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl LoadError {
    /// Shorthand for a [`LoadError::MissingField`].
    pub fn missing(field: &str) -> Self {
        LoadError::MissingField(field.to_string())
    }

    /// Shorthand for a [`LoadError::FieldType`].
    pub fn field_type(field: &str, expected: &'static str) -> Self {
        LoadError::FieldType {
            field: field.to_string(),
            expected,
        }
    }
}
