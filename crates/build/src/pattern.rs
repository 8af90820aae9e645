//! Matchable route patterns.
//!
//! A [`PathPattern`] is an ordered list of [`PatternSegment`]s. Patterns are derived from
//! directory names by the flattener, or parsed from a `routeOverride` string:
//!
//! ```text
//! /books/new          literal segments
//! /books/:id          one dynamic segment
//! /books/:id(\d+)     dynamic segment constrained by a full-segment regex
//! /docs/:slug+        catch-all, one or more segments
//! /docs/:slug*        optional catch-all, zero or more segments
//! ```
//!
//! The directory spellings `[id]`, `[...slug]` and `[[slug]]` are accepted by the parser too.
//! At most one catch-all is allowed and only as the final segment.

use crate::error::BuildError;
use crate::segment::SegmentKind;
use regex::Regex;
use serde::Serialize;
use std::fmt::{self, Display, Formatter, Write};

/// A value bound to a route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::One(value) => Some(value),
            ParamValue::Many(_) => None,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            ParamValue::One(value) => std::slice::from_ref(value),
            ParamValue::Many(values) => values,
        }
    }
}

/// A full-segment regex restricting what a dynamic segment accepts.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source: source.to_string(), regex })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn is_match(&self, segment: &str) -> bool {
        self.regex.is_match(segment)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Literal(String),
    Param { name: String, constraint: Option<Constraint> },
    CatchAll { name: String, constraint: Option<Constraint> },
    OptionalCatchAll { name: String, constraint: Option<Constraint> },
}

impl PatternSegment {
    pub fn param_name(&self) -> Option<&str> {
        match self {
            PatternSegment::Literal(_) => None,
            PatternSegment::Param { name, .. }
            | PatternSegment::CatchAll { name, .. }
            | PatternSegment::OptionalCatchAll { name, .. } => Some(name),
        }
    }

    fn constraint(&self) -> Option<&Constraint> {
        match self {
            PatternSegment::Literal(_) => None,
            PatternSegment::Param { constraint, .. }
            | PatternSegment::CatchAll { constraint, .. }
            | PatternSegment::OptionalCatchAll { constraint, .. } => constraint.as_ref(),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, PatternSegment::CatchAll { .. } | PatternSegment::OptionalCatchAll { .. })
    }

    /// Converts a directory segment into a pattern segment.
    pub fn from_directory(name: &str, kind: &SegmentKind) -> Self {
        match kind {
            SegmentKind::Literal => PatternSegment::Literal(name.to_string()),
            SegmentKind::Dynamic { param } => PatternSegment::Param { name: param.clone(), constraint: None },
            SegmentKind::CatchAll { param } => PatternSegment::CatchAll { name: param.clone(), constraint: None },
            SegmentKind::OptionalCatchAll { param } => {
                PatternSegment::OptionalCatchAll { name: param.clone(), constraint: None }
            }
        }
    }

    fn write_to(&self, f: &mut impl Write, with_names: bool) -> fmt::Result {
        f.write_char('/')?;
        let (name, suffix) = match self {
            PatternSegment::Literal(literal) => return f.write_str(literal),
            PatternSegment::Param { name, .. } => (name, ""),
            PatternSegment::CatchAll { name, .. } => (name, "+"),
            PatternSegment::OptionalCatchAll { name, .. } => (name, "*"),
        };
        f.write_char(':')?;
        if with_names {
            f.write_str(name)?;
        }
        if let Some(constraint) = self.constraint() {
            write!(f, "({})", constraint.source())?;
        }
        f.write_str(suffix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// The pattern of the routes root, matching only `/`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Returns a copy of this pattern extended by one segment.
    pub fn child(&self, segment: PatternSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(PatternSegment::param_name)
    }

    pub fn is_dynamic(&self) -> bool {
        self.segments.iter().any(|segment| !matches!(segment, PatternSegment::Literal(_)))
    }

    /// The pattern text with parameter names erased, two patterns with the same
    /// canonical form match exactly the same request paths.
    pub fn canonical(&self) -> String {
        self.render(false)
    }

    fn render(&self, with_names: bool) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for segment in &self.segments {
            // writing into a String never fails
            let _ = segment.write_to(&mut out, with_names);
        }
        out
    }

    /// Parses a `routeOverride` pattern.
    pub fn parse(pattern: &str) -> Result<Self, BuildError> {
        let raw_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw_segments.len());

        for raw in raw_segments {
            let segment = match raw.strip_prefix(':') {
                Some(param) => parse_param(pattern, param)?,
                None => PatternSegment::from_directory(raw, &SegmentKind::parse(raw)),
            };
            segments.push(segment);
        }

        if let Some(position) = segments.iter().position(PatternSegment::is_terminal) {
            if position + 1 != segments.len() {
                let param = segments[position].param_name().unwrap_or_default().to_string();
                return Err(BuildError::CatchAllNotTerminal { pattern: pattern.to_string(), param });
            }
        }

        Ok(Self { segments })
    }

    /// Matches already split request path segments against this pattern.
    ///
    /// Returns the parameter bindings in pattern order, or `None` if the path does not match.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> Option<Vec<(String, ParamValue)>> {
        let mut bindings = Vec::new();
        let mut rest = path;

        for segment in &self.segments {
            match segment {
                PatternSegment::Literal(literal) => {
                    let (first, tail) = rest.split_first()?;
                    if first.as_ref() != literal {
                        return None;
                    }
                    rest = tail;
                }
                PatternSegment::Param { name, constraint } => {
                    let (first, tail) = rest.split_first()?;
                    if !accepts(constraint.as_ref(), first.as_ref()) {
                        return None;
                    }
                    bindings.push((name.clone(), ParamValue::One(first.as_ref().to_string())));
                    rest = tail;
                }
                PatternSegment::CatchAll { name, constraint } | PatternSegment::OptionalCatchAll { name, constraint } => {
                    if rest.is_empty() && matches!(segment, PatternSegment::CatchAll { .. }) {
                        return None;
                    }
                    if !rest.iter().all(|s| accepts(constraint.as_ref(), s.as_ref())) {
                        return None;
                    }
                    let values = rest.iter().map(|s| s.as_ref().to_string()).collect();
                    bindings.push((name.clone(), ParamValue::Many(values)));
                    rest = &[];
                }
            }
        }

        rest.is_empty().then_some(bindings)
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

#[inline]
fn accepts(constraint: Option<&Constraint>, segment: &str) -> bool {
    constraint.is_none_or(|c| c.is_match(segment))
}

fn parse_param(pattern: &str, raw: &str) -> Result<PatternSegment, BuildError> {
    let name_len = raw.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(raw.len());
    let (name, mut rest) = raw.split_at(name_len);
    if name.is_empty() {
        return Err(BuildError::invalid_pattern(pattern, format!("parameter without a name in '{raw}'")));
    }

    let mut constraint = None;
    if let Some(after_open) = rest.strip_prefix('(') {
        let close = after_open
            .rfind(')')
            .ok_or_else(|| BuildError::invalid_pattern(pattern, format!("unclosed constraint in '{raw}'")))?;
        let source = &after_open[..close];
        let compiled = Constraint::new(source).map_err(|e| BuildError::invalid_pattern(pattern, e))?;
        constraint = Some(compiled);
        rest = &after_open[close + 1..];
    }

    let name = name.to_string();
    match rest {
        "" => Ok(PatternSegment::Param { name, constraint }),
        "+" => Ok(PatternSegment::CatchAll { name, constraint }),
        "*" => Ok(PatternSegment::OptionalCatchAll { name, constraint }),
        other => Err(BuildError::invalid_pattern(pattern, format!("unexpected '{other}' after parameter '{name}'"))),
    }
}
