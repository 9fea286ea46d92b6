mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParsedRule;

/// Parse rule-file text into a list of [`ParsedRule`]s, in file order.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid rule syntax.
pub fn parse(input: &str) -> Result<Vec<ParsedRule>, ParseError> {
    use winnow::Parser;
    grammar::parse_rules
        .parse(input)
        .map_err(|e| ParseError::new(e.offset(), e.inner().to_string()))
}
