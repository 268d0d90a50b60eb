//! Error Types
//!
//! Errors surfaced by the crate's fallible entry points.
//!
//! Shading-language diagnostics have their own type,
//! [`CompileError`](crate::sksl::CompileError), because callers collect them
//! and keep lowering. [`StrataError`] wraps them together with program
//! assembly failures for hosts that want a single error type.
//!
//! ```rust,ignore
//! use strata::errors::Result;
//!
//! fn build(cache: &ProgramCache, pipeline: &Pipeline) -> Result<()> {
//!     let program = cache.find_or_create(pipeline)?;
//!     program.lock().set_data(pipeline);
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::sksl::CompileError;

#[derive(Error, Debug)]
pub enum StrataError {
    // ========================================================================
    // Program Assembly Errors
    // ========================================================================
    /// The program template failed to load or render.
    #[error("Program template error: {0}")]
    Template(#[from] minijinja::Error),

    // ========================================================================
    // Shading Language Errors
    // ========================================================================
    /// A shading-language expression was rejected.
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}

/// Alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
