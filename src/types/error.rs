use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("submit index must be at least 1 in a form of rule '{pattern}'")]
    InvalidSubmitIndex { pattern: String },

    #[error("empty profile name in a form of rule '{pattern}'")]
    EmptyProfile { pattern: String },
}
