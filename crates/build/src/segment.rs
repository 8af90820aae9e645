//! Directory name markers.
//!
//! A directory name decides how its segment matches a request path:
//!
//! | name           | kind                 | matches                         |
//! |----------------|----------------------|---------------------------------|
//! | `about`        | literal              | exactly `about`                 |
//! | `[id]`         | dynamic              | any one segment                 |
//! | `[...slug]`    | catch-all            | one or more remaining segments  |
//! | `[[slug]]`     | optional catch-all   | zero or more remaining segments |
//!
//! `[[...slug]]` is accepted as a spelling of `[[slug]]`.

/// The matching behaviour of one directory segment, derived once from its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Literal,
    Dynamic { param: String },
    CatchAll { param: String },
    OptionalCatchAll { param: String },
}

impl SegmentKind {
    /// Parses the bracket syntax of a directory name.
    ///
    /// Names with empty brackets (`[]`, `[...]`) are literal.
    pub fn parse(name: &str) -> Self {
        if let Some(inner) = name.strip_prefix("[[").and_then(|s| s.strip_suffix("]]")) {
            let param = inner.strip_prefix("...").unwrap_or(inner);
            return match param_name(param) {
                Some(param) => SegmentKind::OptionalCatchAll { param },
                None => SegmentKind::Literal,
            };
        }

        let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
            return SegmentKind::Literal;
        };

        match inner.strip_prefix("...") {
            Some(param) => param_name(param).map_or(SegmentKind::Literal, |param| SegmentKind::CatchAll { param }),
            None => param_name(inner).map_or(SegmentKind::Literal, |param| SegmentKind::Dynamic { param }),
        }
    }

    /// Catch-all and optional catch-all segments are dynamic as well.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, SegmentKind::Literal)
    }

    #[inline]
    pub fn is_catch_all(&self) -> bool {
        matches!(self, SegmentKind::CatchAll { .. })
    }

    #[inline]
    pub fn is_optional_catch_all(&self) -> bool {
        matches!(self, SegmentKind::OptionalCatchAll { .. })
    }

    /// True for both catch-all flavours: nothing below such a segment is routable.
    #[inline]
    pub fn swallows_rest(&self) -> bool {
        self.is_catch_all() || self.is_optional_catch_all()
    }

    pub fn param(&self) -> Option<&str> {
        match self {
            SegmentKind::Literal => None,
            SegmentKind::Dynamic { param }
            | SegmentKind::CatchAll { param }
            | SegmentKind::OptionalCatchAll { param } => Some(param),
        }
    }

    /// Specificity tier used by the sorter, lower is tried first.
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            SegmentKind::Literal => 0,
            SegmentKind::Dynamic { .. } => 1,
            SegmentKind::CatchAll { .. } | SegmentKind::OptionalCatchAll { .. } => 2,
        }
    }
}

fn param_name(raw: &str) -> Option<String> {
    let valid = !raw.is_empty() && !raw.contains(['[', ']', '/']);
    valid.then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        assert_eq!(SegmentKind::parse("about"), SegmentKind::Literal);
        assert_eq!(SegmentKind::parse("v1.2"), SegmentKind::Literal);
        assert!(!SegmentKind::parse("about").is_dynamic());
    }

    #[test]
    fn test_dynamic() {
        let kind = SegmentKind::parse("[id]");
        assert_eq!(kind, SegmentKind::Dynamic { param: "id".into() });
        assert!(kind.is_dynamic());
        assert!(!kind.swallows_rest());
        assert_eq!(kind.param(), Some("id"));
    }

    #[test]
    fn test_catch_all() {
        let kind = SegmentKind::parse("[...slug]");
        assert_eq!(kind, SegmentKind::CatchAll { param: "slug".into() });
        assert!(kind.is_dynamic());
        assert!(kind.is_catch_all());
        assert!(!kind.is_optional_catch_all());
    }

    #[test]
    fn test_optional_catch_all() {
        for name in ["[[slug]]", "[[...slug]]"] {
            let kind = SegmentKind::parse(name);
            assert_eq!(kind, SegmentKind::OptionalCatchAll { param: "slug".into() });
            assert!(kind.is_dynamic());
            assert!(kind.swallows_rest());
        }
    }

    #[test]
    fn test_empty_brackets_are_literal() {
        assert_eq!(SegmentKind::parse("[]"), SegmentKind::Literal);
        assert_eq!(SegmentKind::parse("[...]"), SegmentKind::Literal);
        assert_eq!(SegmentKind::parse("[[]]"), SegmentKind::Literal);
        assert_eq!(SegmentKind::parse("[id"), SegmentKind::Literal);
    }

    #[test]
    fn test_rank() {
        assert!(SegmentKind::parse("new").rank() < SegmentKind::parse("[id]").rank());
        assert!(SegmentKind::parse("[id]").rank() < SegmentKind::parse("[...rest]").rank());
        assert_eq!(SegmentKind::parse("[...rest]").rank(), SegmentKind::parse("[[rest]]").rank());
    }
}
