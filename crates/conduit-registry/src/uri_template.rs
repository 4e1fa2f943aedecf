//! URI templates for resource resolution.
//!
//! A template is a sequence of literal text and `{name}` variables,
//! e.g. `stock://{symbol}/earnings`. A variable binds a non-empty run
//! of characters that contains no `/`. Two variables may not be
//! adjacent, since nothing would separate their values.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Errors from parsing a URI template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `{` without a matching `}`.
    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),
    /// A `}` without a preceding `{`.
    #[error("unmatched '}}' at byte {0}")]
    Unmatched(usize),
    /// `{}`.
    #[error("empty variable name at byte {0}")]
    EmptyVariable(usize),
    /// The same variable appears twice.
    #[error("variable '{0}' appears more than once")]
    DuplicateVariable(String),
    /// `{a}{b}`.
    #[error("variables '{0}' and '{1}' are adjacent")]
    AdjacentVariables(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parses a template string.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyVariable(pos));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    if let Some(Segment::Variable(prev)) = segments.last() {
                        return Err(TemplateError::AdjacentVariables(prev.clone(), name));
                    }
                    let seen = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Variable(v) if *v == name));
                    if seen {
                        return Err(TemplateError::DuplicateVariable(name));
                    }
                    segments.push(Segment::Variable(name));
                }
                '}' => return Err(TemplateError::Unmatched(pos)),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Variable names, in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Variable(v) => Some(v.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the template has no variables (a concrete URI).
    pub fn is_concrete(&self) -> bool {
        self.variables().next().is_none()
    }

    /// Total length of literal text; larger means more specific.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.len(),
                Segment::Variable(_) => 0,
            })
            .sum()
    }

    /// Matches `uri`, returning the bound variables on success.
    pub fn matches(&self, uri: &str) -> Option<BTreeMap<String, String>> {
        let mut bindings = BTreeMap::new();
        if match_segments(&self.segments, uri, &mut bindings) {
            Some(bindings)
        } else {
            None
        }
    }

    /// Substitutes variables. Missing variables expand to nothing.
    pub fn expand(&self, vars: &BTreeMap<String, String>) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.as_str(),
                Segment::Variable(v) => vars.get(v).map(String::as_str).unwrap_or(""),
            })
            .collect()
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn match_segments(
    segments: &[Segment],
    rest: &str,
    bindings: &mut BTreeMap<String, String>,
) -> bool {
    let Some((first, tail)) = segments.split_first() else {
        return rest.is_empty();
    };

    match first {
        Segment::Literal(lit) => match rest.strip_prefix(lit.as_str()) {
            Some(after) => match_segments(tail, after, bindings),
            None => false,
        },
        Segment::Variable(name) => {
            // Candidate ends: every char boundary up to the first '/'.
            let limit = rest.find('/').unwrap_or(rest.len());
            let ends = rest[..limit]
                .char_indices()
                .map(|(i, c)| i + c.len_utf8());
            for end in ends {
                bindings.insert(name.clone(), rest[..end].to_string());
                if match_segments(tail, &rest[end..], bindings) {
                    return true;
                }
            }
            bindings.remove(name);
            false
        }
    }
}
