use std::collections::BTreeSet;
use std::ops::Range;
use std::str::FromStr;

use log::{debug, log_enabled, Level};

use crate::template::context::Context;
use crate::template::error::TemplateError;

/// Opening delimiter of a placeholder token, e.g. `$${nnodes}`
pub const OPEN: &str = "$${";
/// Closing delimiter of a placeholder token
pub const CLOSE: u8 = b'}';

/// A piece of the template, as byte ranges into the raw text
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(Range<usize>),
    Placeholder(Range<usize>),
}

#[derive(Debug, Clone, Copy)]
enum State {
    Literal { start: usize },
    InPlaceholder { open: usize, name_start: usize },
}

/// A job script template with `$${name}` placeholders
///
/// The raw text is scanned once when the template is created. Everything outside a placeholder
/// token is copied verbatim when rendering, including `$VAR` and `$$` shell syntax.
#[derive(Debug, Clone)]
pub struct Template {
    raw: String,
    segments: Vec<Segment>,
    placeholders: BTreeSet<String>,
}

impl Template {
    pub fn new(raw: impl Into<String>) -> Result<Template, TemplateError> {
        let raw = raw.into();
        let segments = scan(&raw)?;
        let placeholders = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(span) => Some(raw[span.clone()].to_string()),
                Segment::Literal(_) => None,
            })
            .collect();

        Ok(Template { raw, segments, placeholders })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Distinct placeholder names referenced by the template
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    /// Every referenced name the context can't resolve, in order of first appearance
    pub fn missing(&self, context: &Context) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in self.placeholder_names() {
            if !context.contains(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    /// Substitute every placeholder with its value from the context
    ///
    /// Substituted values are never scanned again, so a value that looks like a placeholder is
    /// emitted as-is.
    pub fn render(&self, context: &Context) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.raw.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(span) => out.push_str(&self.raw[span.clone()]),
                Segment::Placeholder(span) => {
                    let name = &self.raw[span.clone()];
                    let value = context
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingPlaceholder(name.to_string()))?;
                    out.push_str(value);
                }
            }
        }

        if log_enabled!(Level::Debug) {
            for name in context.names().filter(|n| !self.placeholders.contains(*n)) {
                debug!("Ignoring unused context value {name}");
            }
        }

        Ok(out)
    }

    fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(span) => Some(&self.raw[span.clone()]),
            Segment::Literal(_) => None,
        })
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::new(s)
    }
}

/// Parse and render a template in one go
pub fn render(raw: &str, context: &Context) -> Result<String, TemplateError> {
    Template::new(raw)?.render(context)
}

/// Split the raw text into literal and placeholder segments
///
/// Delimiters are ASCII so every range boundary falls on a char boundary.
fn scan(raw: &str) -> Result<Vec<Segment>, TemplateError> {
    let bytes = raw.as_bytes();
    let delimiter = OPEN.as_bytes();
    let mut segments = Vec::new();
    let mut state = State::Literal { start: 0 };
    let mut i = 0;

    while i < bytes.len() {
        match state {
            State::Literal { start } => {
                if bytes[i..].starts_with(delimiter) {
                    if start < i {
                        segments.push(Segment::Literal(start..i));
                    }
                    state = State::InPlaceholder { open: i, name_start: i + delimiter.len() };
                    i += delimiter.len();
                    continue;
                }
            }
            State::InPlaceholder { open, name_start } => match bytes[i] {
                CLOSE if i == name_start => return Err(malformed(raw, open)),
                CLOSE => {
                    segments.push(Segment::Placeholder(name_start..i));
                    state = State::Literal { start: i + 1 };
                }
                // tokens never span lines
                b'\n' => return Err(malformed(raw, open)),
                _ => {}
            },
        }
        i += 1;
    }

    match state {
        State::Literal { start } => {
            if start < bytes.len() {
                segments.push(Segment::Literal(start..bytes.len()));
            }
            Ok(segments)
        }
        State::InPlaceholder { open, .. } => Err(malformed(raw, open)),
    }
}

fn malformed(raw: &str, offset: usize) -> TemplateError {
    let before = &raw[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |n| n + 1);
    let column = before[line_start..].chars().count() + 1;
    TemplateError::MalformedTemplate { line, column }
}
