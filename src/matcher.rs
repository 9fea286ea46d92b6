use crate::types::{FormSpec, Rule};

/// Collect the form specs of every rule whose pattern matches `uri`.
///
/// Rules are tried in file order and a pattern counts as matching anywhere
/// in the address. Surviving rules contribute their forms in declared order,
/// with no deduplication: a form declared under two matching rules appears
/// twice. An empty result just means nothing matched.
#[must_use]
pub fn matching_forms(rules: &[Rule], uri: &str) -> Vec<FormSpec> {
    rules
        .iter()
        .filter(|rule| rule.matches(uri))
        .flat_map(|rule| rule.forms.iter().cloned())
        .collect()
}
