use thiserror::Error;

use crate::parse::ParseError;
use crate::types::CompileError;

/// Unified error type covering rule parsing, compilation, I/O, and the
/// user-visible fill outcomes.
///
/// `NoRulesMatched` and `NoProfiledForms` are informational: they describe
/// an empty result the user should hear about, not a fault worth logging.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("no rules matched")]
    NoRulesMatched,

    #[error("no forms with profile names found")]
    NoProfiledForms,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
