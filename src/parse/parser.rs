use crate::types::FormSpec;

/// One rule as declared in the file: pattern still in the foreign dialect,
/// form `action` attributes untranslated.
///
/// Turned into a [`Rule`](crate::Rule) by the compile step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    pub pattern: String,
    pub forms: Vec<FormSpec>,
}
