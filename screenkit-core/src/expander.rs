//! `${...}` string templates evaluated against a context.

use crate::accessor::FieldAccessor;
use crate::context::FieldStore;
use screenkit_types::Value;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Field(FieldAccessor),
    /// A placeholder whose name is itself a template: `${labels.${key}}`
    Nested(Vec<Segment>),
}

/// A parsed string template.
///
/// `${path}` placeholders are replaced by the value at that field path;
/// missing values expand to the empty string. `\${` produces a literal `${`,
/// and an unterminated `${` is kept as literal text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expander {
    original: String,
    segments: Vec<Segment>,
}

impl Expander {
    pub fn new(template: &str) -> Self {
        Self {
            original: template.to_string(),
            segments: parse_segments(template),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn expand_string<S: FieldStore + ?Sized>(&self, store: &S) -> String {
        render(&self.segments, store)
    }

    /// Expand to a value. A template that is exactly one placeholder yields
    /// the referenced value unchanged (or null); anything else is a string.
    pub fn expand<S: FieldStore + ?Sized>(&self, store: &S) -> Value {
        match self.segments.as_slice() {
            [Segment::Field(acc)] => acc.get_value(store).unwrap_or(Value::Null),
            [Segment::Nested(inner)] => FieldAccessor::new(&render(inner, store))
                .get_value(store)
                .unwrap_or(Value::Null),
            _ => Value::String(self.expand_string(store)),
        }
    }

    /// One-shot expansion of a template that is not worth keeping parsed.
    pub fn expand_str<S: FieldStore + ?Sized>(template: &str, store: &S) -> String {
        if !template.contains("${") {
            return template.to_string();
        }
        Expander::new(template).expand_string(store)
    }
}

fn render<S: FieldStore + ?Sized>(segments: &[Segment], store: &S) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(acc) => {
                if let Some(value) = acc.get_value(store) {
                    out.push_str(&value.to_string());
                }
            }
            Segment::Nested(inner) => {
                let name = render(inner, store);
                if let Some(value) = FieldAccessor::new(&name).get_value(store) {
                    out.push_str(&value.to_string());
                }
            }
        }
    }
    out
}

fn parse_segments(input: &str) -> Vec<Segment> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes[i + 1..].starts_with(b"${") {
            text.push_str(&input[last..i]);
            text.push_str("${");
            i += 3;
            last = i;
            continue;
        }
        if bytes[i..].starts_with(b"${") {
            let Some(end) = find_close(bytes, i + 2) else {
                break;
            };
            text.push_str(&input[last..i]);
            if !text.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
            }
            let inner = &input[i + 2..end];
            segments.push(if inner.contains("${") {
                Segment::Nested(parse_segments(inner))
            } else {
                Segment::Field(FieldAccessor::new(inner))
            });
            i = end + 1;
            last = i;
            continue;
        }
        i += 1;
    }

    text.push_str(&input[last..]);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}

/// Index of the `}` closing a placeholder opened just before `start`
fn find_close(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"${") {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
        i += 1;
    }
    None
}
