mod error;
mod form;
mod input;
mod rule;

pub use error::CompileError;
pub use form::{FormSpec, Submit};
pub use input::InputSpec;
pub use rule::Rule;
