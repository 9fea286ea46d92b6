//! Translation from the rule file's pattern dialect into the native one.
//!
//! Rule patterns are written in a dialect where every character is literal
//! unless backslash-escaped, and where the escapable set is `. - + * ? ^ $ %`
//! plus the backslash itself. The native dialect is the regex syntax used by
//! the matcher. Translation is pure and total: it never fails, at worst it
//! produces an imprecise pattern.
//!
//! The translation is intentionally approximate. Character classes,
//! alternation, anchors and lookaround are not guaranteed to round-trip;
//! the dialect has no way to express them and no attempt is made to infer
//! them from the input.

/// Characters the foreign dialect can backslash-escape to mean "this exact
/// character".
const FOREIGN_ESCAPABLE: &[char] = &['.', '-', '+', '*', '?', '^', '$', '%', '\\'];

fn is_native_metachar(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    )
}

/// Translate a foreign-dialect pattern into the native dialect.
///
/// Unescaped native metacharacters are escaped (the foreign dialect treats
/// them as literal), foreign escapes from the escapable set become native
/// literal escapes, and anything else copies through unchanged. A trailing
/// lone backslash is emitted escaped so the output stays well-formed.
///
/// Idempotent on patterns that are already native, as long as their only
/// escape sequences come from the foreign escapable set.
#[must_use]
pub fn translate(foreign: &str) -> String {
    let mut out = String::with_capacity(foreign.len() + 8);
    let mut chars = foreign.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(esc) if FOREIGN_ESCAPABLE.contains(&esc) => {
                    out.push('\\');
                    out.push(esc);
                }
                // Unknown escape: pass through untouched, best effort.
                Some(esc) => {
                    out.push('\\');
                    out.push(esc);
                }
                None => out.push_str("\\\\"),
            }
        } else if is_native_metachar(c) {
            out.push('\\');
            out.push(c);
        } else {
            out.push(c);
        }
    }
    out
}

/// Translate a form `action` pattern, then strip every residual backslash.
///
/// Actions are matched literally on the content side, where escape markers
/// have no meaning and would only break the comparison.
#[must_use]
pub fn translate_action(foreign: &str) -> String {
    translate(foreign).chars().filter(|&c| c != '\\').collect()
}
