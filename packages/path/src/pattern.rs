//! Wildcard patterns over paths.
//!
//! A pattern uses the same segment syntax as [`Path`] plus two wildcards:
//! `*` matches exactly one segment (any key or index), `**` matches zero or
//! more segments. `*` is also accepted inside brackets (`items[*]`), where it
//! behaves identically to the bare form.

use crate::{lex, Path, RawSegment, Segment};

/// One segment of a [`Pattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches a key segment with this exact name.
    Key(String),
    /// Matches an index segment with this exact index.
    Index(usize),
    /// `*` — matches exactly one segment of either kind.
    Any,
    /// `**` — matches zero or more segments.
    Glob,
}

impl PatternSegment {
    fn matches(&self, segment: &Segment) -> bool {
        match (self, segment) {
            (PatternSegment::Any, _) => true,
            (PatternSegment::Key(k), Segment::Key(s)) => k == s,
            (PatternSegment::Index(i), Segment::Index(s)) => i == s,
            _ => false,
        }
    }
}

/// A compiled wildcard pattern.
///
/// # Examples
///
/// ```rust
/// use reform_path::{path, Pattern};
///
/// assert!(Pattern::parse("a.*.c").matches(&path!("a.b.c")));
/// assert!(Pattern::parse("a.**").matches(&path!("a.b.c.d")));
/// assert!(!Pattern::parse("a.*").matches(&path!("a.b.c")));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    pub segments: Vec<PatternSegment>,
}

impl Pattern {
    /// Parse a pattern string. Malformed input degrades to the empty
    /// pattern, which matches only the empty path.
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or_default()
    }

    fn try_parse(s: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for raw in lex(s)? {
            segments.push(match raw {
                RawSegment::Bare("*") | RawSegment::Bracket("*") => PatternSegment::Any,
                RawSegment::Bare("**") => PatternSegment::Glob,
                RawSegment::Bare(k) => PatternSegment::Key(k.to_string()),
                RawSegment::Bracket(idx) => {
                    if idx.is_empty() || !idx.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    PatternSegment::Index(idx.parse().ok()?)
                }
            });
        }
        Some(Pattern { segments })
    }

    /// Check whether the pattern matches a path.
    ///
    /// Backtracking over segment indices: `**` tries every split point. The
    /// empty pattern matches the empty path; a bare `**` matches everything
    /// including the empty path.
    pub fn matches(&self, path: &Path) -> bool {
        match_from(&self.segments, &path.segments)
    }
}

fn match_from(pattern: &[PatternSegment], path: &[Segment]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((PatternSegment::Glob, rest)) => {
            (0..=path.len()).any(|skip| match_from(rest, &path[skip..]))
        }
        Some((head, rest)) => match path.split_first() {
            Some((segment, path_rest)) => head.matches(segment) && match_from(rest, path_rest),
            None => false,
        },
    }
}

/// Convenience form: parse and match in one call.
pub fn matches(pattern: &str, path: &Path) -> bool {
    Pattern::parse(pattern).matches(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn exact_match() {
        assert!(matches("a.b.c", &path!("a.b.c")));
        assert!(!matches("a.b.c", &path!("a.b")));
        assert!(!matches("a.b", &path!("a.b.c")));
        assert!(matches("a[0]", &path!("a[0]")));
        assert!(!matches("a[0]", &path!("a[1]")));
    }

    #[test]
    fn single_wildcard() {
        assert!(matches("a.*.c", &path!("a.b.c")));
        assert!(matches("a.*.c", &path!("a[5].c")));
        assert!(!matches("a.*", &path!("a.b.c")));
        assert!(!matches("a.*", &path!("a")));
    }

    #[test]
    fn bracket_wildcard() {
        assert!(matches("items[*].sku", &path!("items[3].sku")));
        assert!(matches("items[*].sku", &path!("items.x.sku")));
    }

    #[test]
    fn glob_wildcard() {
        assert!(matches("a.**", &path!("a.b.c.d")));
        assert!(matches("a.**", &path!("a")));
        assert!(matches("a.**.d", &path!("a.b.c.d")));
        assert!(matches("a.**.d", &path!("a.d")));
        assert!(!matches("a.**.d", &path!("a.b.c")));
    }

    #[test]
    fn bare_glob_matches_everything() {
        assert!(matches("**", &Path::root()));
        assert!(matches("**", &path!("a")));
        assert!(matches("**", &path!("a.b[0].c")));
    }

    #[test]
    fn empty_pattern_matches_empty_path() {
        assert!(matches("", &Path::root()));
        assert!(!matches("", &path!("a")));
    }

    #[test]
    fn key_does_not_match_index() {
        // Written as a key, `3` only matches the key form.
        assert!(matches("a.3", &path!("a.3")));
        assert!(!matches("a.3", &path!("a[3]")));
    }

    #[test]
    fn malformed_pattern_degrades_to_empty() {
        assert!(Pattern::parse("a..b").segments.is_empty());
        assert!(!Pattern::parse("a..b").matches(&path!("a.b")));
    }

    #[test]
    fn double_glob_backtracks() {
        assert!(matches("**.c.**", &path!("a.c.b")));
        assert!(matches("**.c.**", &path!("c")));
        assert!(!matches("**.c.**", &path!("a.b")));
    }
}
