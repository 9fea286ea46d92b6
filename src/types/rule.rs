use regex::Regex;

use super::form::FormSpec;

/// A compiled autofill rule: a page-address pattern and the forms to fill
/// when it matches.
///
/// Produced by [`compile_rules`](crate::compile_rules) or
/// [`RuleStore::load`](crate::RuleStore::load). By the time a `Rule` exists
/// its `pattern` is in the native dialect (translation happens exactly once,
/// at compile time) and `matcher` is the compiled form of that pattern.
/// Rules keep the order they were declared in; that order decides which
/// form is applied first downstream.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Native-dialect pattern, matched anywhere in the page address.
    pub pattern: String,
    pub(crate) matcher: Regex,
    pub forms: Vec<FormSpec>,
}

impl Rule {
    /// Whether this rule applies to the given page address.
    ///
    /// The pattern matches anywhere in the address, not just the whole of it.
    #[must_use]
    pub fn matches(&self, uri: &str) -> bool {
        self.matcher.is_match(uri)
    }
}
