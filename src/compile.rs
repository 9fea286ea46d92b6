use regex::Regex;

use crate::parse::ParsedRule;
use crate::translate::{translate, translate_action};
use crate::types::{CompileError, Rule, Submit};

/// Turn parsed rules into compiled ones: validate, translate each pattern
/// into the native dialect (exactly once, here), and compile its matcher.
pub(crate) fn compile(parsed: Vec<ParsedRule>) -> Result<Vec<Rule>, CompileError> {
    parsed.into_iter().map(compile_rule).collect()
}

fn compile_rule(parsed: ParsedRule) -> Result<Rule, CompileError> {
    for form in &parsed.forms {
        if form.submit == Some(Submit::Button(0)) {
            return Err(CompileError::InvalidSubmitIndex {
                pattern: parsed.pattern.clone(),
            });
        }
        if form.profile.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(CompileError::EmptyProfile {
                pattern: parsed.pattern.clone(),
            });
        }
    }

    let pattern = translate(&parsed.pattern);
    let matcher = compile_pattern(&pattern);

    let forms = parsed
        .forms
        .into_iter()
        .map(|mut form| {
            if let Some(action) = form.action.take() {
                form.action = Some(translate_action(&action));
            }
            form
        })
        .collect();

    Ok(Rule {
        pattern,
        matcher,
        forms,
    })
}

// Translation is total but only best-effort; if the result is not a valid
// native pattern, fall back to matching the translated text literally.
fn compile_pattern(native: &str) -> Regex {
    match Regex::new(native) {
        Ok(matcher) => matcher,
        Err(err) => {
            tracing::debug!(pattern = native, %err, "pattern rejected, matching it literally");
            Regex::new(&regex::escape(native)).expect("escaped pattern always compiles")
        }
    }
}
