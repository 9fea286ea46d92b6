mod compile;
mod coordinator;
mod error;
mod matcher;
mod parse;
mod protocol;
mod store;
mod translate;
mod types;

pub use coordinator::{FillCoordinator, UiEvent};
pub use error::FillError;
pub use matcher::matching_forms;
pub use parse::ParseError;
pub use protocol::{ContentReply, CoreMessage, ViewId};
pub use store::RuleStore;
pub use translate::{translate, translate_action};
pub use types::{CompileError, FormSpec, InputSpec, Rule, Submit};

/// Parse rule-file text and compile it into an ordered list of [`Rule`]s.
///
/// Patterns are translated into the native dialect here, exactly once;
/// rules come out in file order.
///
/// # Errors
///
/// Returns [`FillError`] on a parse or compile fault.
///
/// # Example
///
/// ```
/// let rules = formfill::compile_rules(
///     r#"on "example.com" { form "work" { input { name = "user", value = "alice" } } }"#,
/// )
/// .unwrap();
/// assert_eq!(rules.len(), 1);
/// assert!(rules[0].matches("https://example.com/login"));
/// ```
pub fn compile_rules(text: &str) -> Result<Vec<Rule>, FillError> {
    let parsed = parse::parse(text)?;
    let rules = compile::compile(parsed)?;
    Ok(rules)
}
