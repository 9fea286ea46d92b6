use winnow::ascii::{dec_uint, till_line_ending};
use winnow::combinator::{alt, cut_err, opt, preceded, repeat, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_until, take_while};

use crate::types::{FormSpec, InputSpec, Submit};

use super::parser::ParsedRule;

// The rule DSL is a closed grammar: three constructs (`on`, `form`, `input`),
// literal values, nothing else. No bindings, no calls, no expressions -- a
// rule file can only ever construct rule data.

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// Items inside `{ ... }` bodies may be separated by a comma; the comma is
// optional so that machine-captured fragments and hand-written rules both
// parse.
fn item_sep(input: &mut &str) -> ModalResult<()> {
    ws.parse_next(input)?;
    let _ = opt(',').parse_next(input)?;
    Ok(())
}

// -- String literals --------------------------------------------------------

fn quoted_string(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

// `[[...]]` raw strings carry no escapes; handy for patterns full of
// backslashes.
fn raw_string(input: &mut &str) -> ModalResult<String> {
    preceded("[[", cut_err(terminated(take_until(0.., "]]"), "]]")))
        .map(str::to_owned)
        .parse_next(input)
}

fn pattern_literal(input: &mut &str) -> ModalResult<String> {
    alt((raw_string, quoted_string))
        .context(StrContext::Expected(StrContextValue::Description(
            "rule pattern",
        )))
        .parse_next(input)
}

fn string_value(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    quoted_string
        .context(StrContext::Expected(StrContextValue::Description(
            "string value",
        )))
        .parse_next(input)
}

fn bool_value(input: &mut &str) -> ModalResult<bool> {
    ws.parse_next(input)?;
    alt(("true".value(true), "false".value(false)))
        .context(StrContext::Expected(StrContextValue::Description(
            "boolean value",
        )))
        .parse_next(input)
}

fn submit_value(input: &mut &str) -> ModalResult<Submit> {
    ws.parse_next(input)?;
    alt((
        "true".value(Submit::Form),
        dec_uint::<_, u32, _>.map(Submit::Button),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "`true` or a button index",
    )))
    .parse_next(input)
}

// -- Form attributes --------------------------------------------------------

enum FormAttr {
    Method(String),
    Action(String),
    ClassName(String),
    Id(String),
    Submit(Submit),
}

fn eq(input: &mut &str) -> ModalResult<()> {
    (ws, '=').void().parse_next(input)
}

fn form_attr(input: &mut &str) -> ModalResult<FormAttr> {
    ws.parse_next(input)?;
    alt((
        preceded(("method", eq), cut_err(string_value)).map(FormAttr::Method),
        preceded(("action", eq), cut_err(string_value)).map(FormAttr::Action),
        preceded(("className", eq), cut_err(string_value)).map(FormAttr::ClassName),
        preceded(("id", eq), cut_err(string_value)).map(FormAttr::Id),
        preceded(("submit", eq), cut_err(submit_value)).map(FormAttr::Submit),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "form attribute",
    )))
    .parse_next(input)
}

// -- Input blocks -----------------------------------------------------------

enum InputAttr {
    Name(String),
    Kind(String),
    ClassName(String),
    Id(String),
    Value(String),
    Checked(bool),
    Focus(bool),
    Select(bool),
}

fn input_attr(input: &mut &str) -> ModalResult<InputAttr> {
    ws.parse_next(input)?;
    alt((
        preceded(("name", eq), cut_err(string_value)).map(InputAttr::Name),
        preceded(("type", eq), cut_err(string_value)).map(InputAttr::Kind),
        preceded(("className", eq), cut_err(string_value)).map(InputAttr::ClassName),
        preceded(("id", eq), cut_err(string_value)).map(InputAttr::Id),
        preceded(("value", eq), cut_err(string_value)).map(InputAttr::Value),
        preceded(("checked", eq), cut_err(bool_value)).map(InputAttr::Checked),
        preceded(("focus", eq), cut_err(bool_value)).map(InputAttr::Focus),
        preceded(("select", eq), cut_err(bool_value)).map(InputAttr::Select),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "input attribute",
    )))
    .parse_next(input)
}

fn input_block(input: &mut &str) -> ModalResult<InputSpec> {
    ws.parse_next(input)?;
    ("input", ws, '{').parse_next(input)?;

    let attrs: Vec<InputAttr> =
        repeat(0.., terminated(input_attr, item_sep)).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('}').parse_next(input)?;

    let mut spec = InputSpec::default();
    for attr in attrs {
        match attr {
            InputAttr::Name(v) => spec.name = Some(v),
            InputAttr::Kind(v) => spec.kind = Some(v),
            InputAttr::ClassName(v) => spec.class_name = Some(v),
            InputAttr::Id(v) => spec.id = Some(v),
            InputAttr::Value(v) => spec.value = Some(v),
            InputAttr::Checked(v) => spec.checked = Some(v),
            InputAttr::Focus(v) => spec.focus = Some(v),
            InputAttr::Select(v) => spec.select = Some(v),
        }
    }
    Ok(spec)
}

// -- Form definitions -------------------------------------------------------

enum FormItem {
    Input(InputSpec),
    Attr(FormAttr),
}

fn form_item(input: &mut &str) -> ModalResult<FormItem> {
    alt((input_block.map(FormItem::Input), form_attr.map(FormItem::Attr))).parse_next(input)
}

fn form_def(input: &mut &str) -> ModalResult<FormSpec> {
    ws.parse_next(input)?;
    "form".parse_next(input)?;

    // `form "name" { ... }` is a profiled form, `form { ... }` is not.
    // Resolved here, structurally, once.
    let profile = opt(preceded(ws, quoted_string)).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err('{')
        .context(StrContext::Expected(StrContextValue::CharLiteral('{')))
        .parse_next(input)?;

    let items: Vec<FormItem> = repeat(0.., terminated(form_item, item_sep)).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('}').parse_next(input)?;

    let mut spec = FormSpec {
        profile,
        ..FormSpec::default()
    };
    for item in items {
        match item {
            FormItem::Input(input_spec) => spec.inputs.push(input_spec),
            FormItem::Attr(FormAttr::Method(v)) => spec.method = Some(v),
            FormItem::Attr(FormAttr::Action(v)) => spec.action = Some(v),
            FormItem::Attr(FormAttr::ClassName(v)) => spec.class_name = Some(v),
            FormItem::Attr(FormAttr::Id(v)) => spec.id = Some(v),
            FormItem::Attr(FormAttr::Submit(v)) => spec.submit = Some(v),
        }
    }
    Ok(spec)
}

// -- Rule definitions -------------------------------------------------------

fn rule_def(input: &mut &str) -> ModalResult<ParsedRule> {
    ws.parse_next(input)?;
    "on".parse_next(input)?;
    ws.parse_next(input)?;

    let pattern = cut_err(pattern_literal).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err('{')
        .context(StrContext::Expected(StrContextValue::CharLiteral('{')))
        .parse_next(input)?;

    let forms: Vec<FormSpec> = repeat(0.., terminated(form_def, item_sep)).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('}').parse_next(input)?;

    Ok(ParsedRule { pattern, forms })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_rules(input: &mut &str) -> ModalResult<Vec<ParsedRule>> {
    let rules: Vec<ParsedRule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(rules)
}
