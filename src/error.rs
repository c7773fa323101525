//! The shell's top-level error type, aggregating the smaller per-layer
//! errors the way the teacher crate's `PopenError` aggregates `io::Error`
//! and `FromUtf8Error`. See SPEC_FULL.md §7 for the error-kind taxonomy.

use thiserror::Error;

use crate::lexer::LexError;
use crate::redirect::RedirectError;
use crate::splitter::SplitError;

#[derive(Debug, Error)]
pub enum ShellError {
    /// Tokenizer/splitter/redirection syntax errors -- the line is
    /// abandoned, the REPL continues.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A command name did not resolve via the builtin table or `PATH`.
    #[error("{0}: command not found")]
    NotFound(String),

    /// An OS call (`open`, `fork`, `pipe`, `dup2`, `chdir`, `execv`) failed.
    #[error("{context}: {source}")]
    Os {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A builtin was invoked with bad arguments or failed for a
    /// builtin-specific reason (`cd` into a missing directory, etc).
    #[error("{0}")]
    BuiltinUsage(String),
}

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Redirect(#[from] RedirectError),
}

impl ShellError {
    pub fn os(context: impl Into<String>, source: std::io::Error) -> Self {
        ShellError::Os { context: context.into(), source }
    }
}
