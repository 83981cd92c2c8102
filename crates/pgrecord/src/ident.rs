//! SQL identifier validation.
//!
//! Column and table names are the only text pgrecord splices into SQL, so
//! every name passes through [`Ident`] before it reaches a statement:
//!
//! - bare parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - quoted parts (`"Order"`) may hold anything except NUL; `""` escapes a quote
//! - table names may be schema-qualified (`public.users`), column names may not

use crate::error::{RecordError, RecordResult};
use std::fmt;

/// One dot-separated segment of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Bare(String),
    Quoted(String),
}

/// A validated SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    segments: Vec<Segment>,
    rendered: String,
}

impl Ident {
    /// Parse a possibly schema-qualified name such as `users`, `public.users`
    /// or `"Sales"."Order"`.
    pub fn parse(input: &str) -> RecordResult<Self> {
        if input.is_empty() {
            return Err(RecordError::validation("identifier cannot be empty"));
        }
        if input.contains('\0') {
            return Err(RecordError::validation(
                "identifier cannot contain NUL character",
            ));
        }

        let mut segments = Vec::new();
        let mut rest = input;
        loop {
            let (segment, tail) = scan_segment(rest)?;
            segments.push(segment);
            match tail.strip_prefix('.') {
                Some("") => {
                    return Err(RecordError::validation(format!(
                        "trailing '.' in identifier `{input}`"
                    )));
                }
                Some(next) => rest = next,
                None if tail.is_empty() => break,
                None => {
                    return Err(RecordError::validation(format!(
                        "unexpected `{tail}` in identifier `{input}`"
                    )));
                }
            }
        }

        let rendered = render(&segments);
        Ok(Self { segments, rendered })
    }

    /// Parse a column name: a single, unqualified identifier.
    pub fn column(input: &str) -> RecordResult<Self> {
        let ident = Self::parse(input)?;
        if ident.segments.len() != 1 {
            return Err(RecordError::validation(format!(
                "column name `{input}` must not be qualified"
            )));
        }
        Ok(ident)
    }

    /// Number of dot-separated parts.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; an `Ident` has at least one part.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The identifier as it appears in SQL text.
    pub fn as_sql(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Consume one segment from the front of `s`, returning it and the remainder.
fn scan_segment(s: &str) -> RecordResult<(Segment, &str)> {
    if let Some(body) = s.strip_prefix('"') {
        let mut name = String::new();
        let mut chars = body.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '"' {
                name.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '"'))) {
                chars.next();
                name.push('"');
                continue;
            }
            if name.is_empty() {
                return Err(RecordError::validation("empty quoted identifier"));
            }
            return Ok((Segment::Quoted(name), &body[i + 1..]));
        }
        return Err(RecordError::validation("unclosed quoted identifier"));
    }

    let end = s.find('.').unwrap_or(s.len());
    let part = &s[..end];
    let mut chars = part.chars();
    match chars.next() {
        None => return Err(RecordError::validation("empty identifier segment")),
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(RecordError::validation(format!(
                "invalid identifier start character: '{c}'"
            )));
        }
    }
    if let Some(c) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(RecordError::validation(format!(
            "invalid character in identifier: '{c}'"
        )));
    }
    Ok((Segment::Bare(part.to_string()), &s[end..]))
}

fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match segment {
            Segment::Bare(name) => out.push_str(name),
            Segment::Quoted(name) => {
                out.push('"');
                out.push_str(&name.replace('"', "\"\""));
                out.push('"');
            }
        }
    }
    out
}
