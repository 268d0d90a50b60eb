//! Front-end diagnostics.
//!
//! Index resolution never panics or unwinds on bad input: every failure is a
//! [`CompileError`] value tagged with the source line. Callers that want to keep
//! lowering after a failure push errors into an [`ErrorReporter`].

use thiserror::Error;

/// Why an array dimension was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArraySizeError {
    #[error("array size must be an integer")]
    NotInteger,

    #[error("array size must be positive")]
    NotPositive,

    #[error("array size is too large")]
    TooLarge,

    #[error("multi-dimensional arrays are not supported")]
    MultiDimensional,

    #[error("type 'void' may not be used in an array")]
    Void,

    #[error("opaque type '{0}' may not be used in an array")]
    Opaque(String),
}

/// Diagnostic categories produced while resolving index expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The base of `base[index]` is not an array, vector or matrix.
    #[error("expected array, but found '{ty}'")]
    NotIndexable { ty: String },

    /// The index could not be coerced to the default integer type.
    #[error("expected '{expected}', but found '{found}'")]
    IndexNotInteger { expected: String, found: String },

    /// A compile-time constant index outside `[0, columns)`.
    #[error("index {index} out of range for '{ty}'")]
    IndexOutOfRange { index: i64, ty: String },

    /// The size in an array type constructor (`int[N]`) is invalid.
    #[error("{0}")]
    InvalidArraySize(#[from] ArraySizeError),
}

/// A diagnostic attached to a source line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}: {kind}")]
pub struct CompileError {
    pub line: i32,
    pub kind: CompileErrorKind,
}

impl CompileError {
    #[must_use]
    pub fn new(line: i32, kind: impl Into<CompileErrorKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }
}

/// Collects diagnostics so lowering can continue past the first failure.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<CompileError>,
}

impl ErrorReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: CompileError) {
        log::debug!("sksl: {error}");
        self.errors.push(error);
    }

    /// Unwraps a successful result, or records the error and returns `None`.
    pub fn check<T>(&mut self, result: Result<T, CompileError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(error);
                None
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// Drains the collected diagnostics.
    pub fn take(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }
}
