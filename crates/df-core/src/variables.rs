//! `{{ variable }}` placeholders inside text content.
//!
//! Template text can reference variables (`Dear {{ client_name }},`). The
//! builder keeps the placeholders verbatim while editing; the export
//! snapshot substitutes values. A `{{` that does not start a well-formed
//! placeholder is ordinary text.

use winnow::ascii::space0;
use winnow::combinator::delimited;
use winnow::prelude::*;
use winnow::token::take_while;

/// A piece of scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// `name` is the trimmed variable name, `raw` the full `{{ … }}` slice.
    Placeholder { name: &'a str, raw: &'a str },
}

fn variable_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')).parse_next(input)
}

fn placeholder<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited(("{{", space0), variable_name, (space0, "}}")).parse_next(input)
}

/// Split `text` into literal runs and placeholders.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            out.push(Segment::Literal(&rest[..start]));
        }
        let candidate = &rest[start..];
        let mut cursor = candidate;
        match placeholder.parse_next(&mut cursor) {
            Ok(name) => {
                let consumed = candidate.len() - cursor.len();
                out.push(Segment::Placeholder {
                    name,
                    raw: &candidate[..consumed],
                });
                rest = cursor;
            }
            Err(_) => {
                out.push(Segment::Literal("{{"));
                rest = &candidate[2..];
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

/// Distinct variable names referenced by `text`, in first-use order.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for seg in segments(text) {
        if let Segment::Placeholder { name, .. } = seg
            && !names.contains(&name)
        {
            names.push(name);
        }
    }
    names
}

/// Substitute placeholders using `lookup`. Unknown variables are left as
/// written.
pub fn render<'v>(text: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(text.len());
    for seg in segments(text) {
        match seg {
            Segment::Literal(s) => out.push_str(s),
            Segment::Placeholder { name, raw } => match lookup(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(raw),
            },
        }
    }
    out
}
