//! Path addressing for nested form values.
//!
//! A [`Path`] is an ordered list of segments, each either a string key (map
//! entry) or a non-negative index (array element). The canonical string form
//! writes the first segment bare, later keys dot-prefixed, and indices
//! bracket-wrapped: `a.b[2].c`.
//!
//! Parsing is total: malformed input degrades to the empty path, which every
//! value operation treats as a no-op. Round-tripping holds for any segment
//! list whose keys are free of the control characters `.`, `[`, `]`:
//! `Path::parse(&p.to_string()) == p`.
//!
//! # Example
//!
//! ```rust
//! use reform_path::{path, Path, Segment};
//!
//! let p = path!("order.items[2].sku");
//! assert_eq!(p.depth(), 4);
//! assert_eq!(p.segments[2], Segment::Index(2));
//! assert_eq!(p.to_string(), "order.items[2].sku");
//! ```

use std::fmt;
use std::str::FromStr;

mod pattern;

pub use pattern::{Pattern, PatternSegment};

/// One step of a [`Path`]: a map key or an array index.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    /// String key into a map.
    Key(String),
    /// Numeric index into an array.
    Index(usize),
}

impl Segment {
    /// The key string, if this segment is a key.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    /// The index, if this segment is an index.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(i) => Some(*i),
        }
    }
}

impl From<&str> for Segment {
    fn from(k: &str) -> Self {
        Segment::Key(k.to_string())
    }
}

impl From<String> for Segment {
    fn from(k: String) -> Self {
        Segment::Key(k)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// A parsed path into a nested values tree.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub segments: Vec<Segment>,
}

/// Raw lexed piece of a path string, shared with the pattern parser.
#[derive(Debug, PartialEq)]
pub(crate) enum RawSegment<'a> {
    /// A bare or dot-prefixed run of non-control characters.
    Bare(&'a str),
    /// The content between `[` and `]`.
    Bracket(&'a str),
}

/// Split a path string into raw segments.
///
/// Returns `None` on malformed input: an empty key (`a..b`, trailing dot),
/// an unterminated bracket, a bare key appearing without a dot after the
/// first segment, or a stray `]`.
pub(crate) fn lex(s: &str) -> Option<Vec<RawSegment<'_>>> {
    let mut out = Vec::new();
    if s.is_empty() {
        return Some(out);
    }
    let bytes = s.as_bytes();
    let n = bytes.len();
    let mut i = 0;
    while i < n {
        match bytes[i] {
            b'[' => {
                let close = s[i..].find(']')? + i;
                out.push(RawSegment::Bracket(&s[i + 1..close]));
                i = close + 1;
            }
            b'.' => {
                if out.is_empty() {
                    return None;
                }
                i += 1;
                let start = i;
                while i < n && bytes[i] != b'.' && bytes[i] != b'[' {
                    if bytes[i] == b']' {
                        return None;
                    }
                    i += 1;
                }
                if i == start {
                    return None;
                }
                out.push(RawSegment::Bare(&s[start..i]));
            }
            b']' => return None,
            _ => {
                if !out.is_empty() {
                    return None;
                }
                let start = i;
                while i < n && bytes[i] != b'.' && bytes[i] != b'[' {
                    if bytes[i] == b']' {
                        return None;
                    }
                    i += 1;
                }
                out.push(RawSegment::Bare(&s[start..i]));
            }
        }
    }
    Some(out)
}

impl Path {
    /// The empty (root) path.
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse a path string.
    ///
    /// Bracketed segments must hold a non-negative integer; everything else
    /// is a key. Malformed input (unterminated bracket, empty key, stray
    /// `]`, non-numeric index) degrades to the empty path rather than
    /// erroring — the value operations treat an empty path as a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reform_path::Path;
    ///
    /// assert_eq!(Path::parse("a.b[2].c").depth(), 4);
    /// assert_eq!(Path::parse(""), Path::root());
    /// assert_eq!(Path::parse("a..b"), Path::root());
    /// assert_eq!(Path::parse("a[x]"), Path::root());
    /// ```
    pub fn parse(s: &str) -> Self {
        Self::try_parse(s).unwrap_or_default()
    }

    fn try_parse(s: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for raw in lex(s)? {
            match raw {
                RawSegment::Bare(k) => segments.push(Segment::Key(k.to_string())),
                RawSegment::Bracket(idx) => {
                    // Reject empty and `+`/`-` prefixed forms that usize::parse allows.
                    if idx.is_empty() || !idx.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    segments.push(Segment::Index(idx.parse().ok()?));
                }
            }
        }
        Some(Path { segments })
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Path { segments }
    }

    /// Check if this path is empty (the root).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Number of segments (alias used by callers thinking in tree depth).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over segments.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    /// Append one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Path { segments }
    }

    /// The path with the last segment removed. The root is its own parent.
    #[must_use]
    pub fn parent(&self) -> Path {
        let mut segments = self.segments.clone();
        segments.pop();
        Path { segments }
    }

    /// The last segment, if any.
    pub fn basename(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Check if `self` is a strict descendant of `parent`.
    ///
    /// A path is not a child of itself; everything non-empty is a child of
    /// the root.
    pub fn is_child_of(&self, parent: &Path) -> bool {
        parent.segments.len() < self.segments.len()
            && parent.segments == self.segments[..parent.segments.len()]
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) => {
                    if i > 0 {
                        write!(f, ".{}", k)?;
                    } else {
                        write!(f, "{}", k)?;
                    }
                }
                Segment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::parse(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Segment;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use reform_path::path;
///
/// let p = path!("vehicle.model[0]");
/// assert_eq!(p.depth(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_paths() {
        assert_eq!(Path::parse("").len(), 0);
        assert_eq!(Path::parse("foo").len(), 1);
        assert_eq!(Path::parse("foo.bar").len(), 2);
        assert_eq!(Path::parse("foo.bar.baz").len(), 3);
    }

    #[test]
    fn parse_indices() {
        let p = Path::parse("items[2].name");
        assert_eq!(p.len(), 3);
        assert_eq!(p[1], Segment::Index(2));
        assert_eq!(p[2], Segment::Key("name".to_string()));
    }

    #[test]
    fn parse_leading_index() {
        let p = Path::parse("[0].a");
        assert_eq!(p.len(), 2);
        assert_eq!(p[0], Segment::Index(0));
    }

    #[test]
    fn parse_adjacent_indices() {
        let p = Path::parse("grid[1][2]");
        assert_eq!(p.len(), 3);
        assert_eq!(p[1], Segment::Index(1));
        assert_eq!(p[2], Segment::Index(2));
    }

    #[test]
    fn malformed_degrades_to_root() {
        assert_eq!(Path::parse("a..b"), Path::root());
        assert_eq!(Path::parse("a."), Path::root());
        assert_eq!(Path::parse(".a"), Path::root());
        assert_eq!(Path::parse("a[1"), Path::root());
        assert_eq!(Path::parse("a[x]"), Path::root());
        assert_eq!(Path::parse("a[]"), Path::root());
        assert_eq!(Path::parse("a[-1]"), Path::root());
        assert_eq!(Path::parse("a]b"), Path::root());
        assert_eq!(Path::parse("a[0]b"), Path::root());
    }

    #[test]
    fn stringify_roundtrip() {
        for s in [
            "",
            "a",
            "a.b",
            "a.b[2].c",
            "[0]",
            "[0].a[1]",
            "items[10][20]",
            "order.items[2].sku",
        ] {
            assert_eq!(Path::parse(s).to_string(), s, "round trip of {:?}", s);
        }
    }

    #[test]
    fn roundtrip_from_segments() {
        let p = Path::from_segments(vec![
            Segment::Key("a".into()),
            Segment::Index(3),
            Segment::Key("名前".into()),
        ]);
        assert_eq!(Path::parse(&p.to_string()), p);
    }

    #[test]
    fn unicode_keys() {
        let p = Path::parse("usuarios.名前");
        assert_eq!(p.len(), 2);
        assert_eq!(p[1].as_key(), Some("名前"));
    }

    #[test]
    fn join_and_child() {
        let p = path!("a.b").join(&path!("c[0]"));
        assert_eq!(p.to_string(), "a.b.c[0]");
        assert_eq!(path!("a").child(2).to_string(), "a[2]");
        assert_eq!(path!("a").child("b").to_string(), "a.b");
    }

    #[test]
    fn join_with_empty() {
        assert_eq!(path!("a").join(&Path::root()), path!("a"));
        assert_eq!(Path::root().join(&path!("a")), path!("a"));
    }

    #[test]
    fn parent_and_basename() {
        let p = path!("a.b[2]");
        assert_eq!(p.parent(), path!("a.b"));
        assert_eq!(p.basename(), Some(&Segment::Index(2)));
        assert_eq!(Path::root().parent(), Path::root());
        assert_eq!(Path::root().basename(), None);
    }

    #[test]
    fn is_child_of() {
        assert!(path!("a.b.c").is_child_of(&path!("a.b")));
        assert!(path!("a.b.c").is_child_of(&path!("a")));
        assert!(path!("a").is_child_of(&Path::root()));
        assert!(!path!("a.b").is_child_of(&path!("a.b")));
        assert!(!path!("a.b").is_child_of(&path!("b")));
        assert!(!path!("a").is_child_of(&path!("a.b")));
    }

    #[test]
    fn depth_matches_len() {
        assert_eq!(path!("a.b[0]").depth(), 3);
        assert_eq!(Path::root().depth(), 0);
    }

    #[test]
    fn segment_accessors() {
        assert_eq!(Segment::Key("k".into()).as_key(), Some("k"));
        assert_eq!(Segment::Key("k".into()).as_index(), None);
        assert_eq!(Segment::Index(4).as_index(), Some(4));
        assert_eq!(Segment::Index(4).as_key(), None);
    }

    #[test]
    fn path_ord_and_hash() {
        use std::collections::HashSet;
        assert!(path!("a.b") < path!("a.c"));
        let mut set = HashSet::new();
        set.insert(path!("foo"));
        set.insert(path!("foo"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn from_str_and_from() {
        let p: Path = "a.b".parse().unwrap();
        assert_eq!(p, path!("a.b"));
        let p: Path = "a[0]".into();
        assert_eq!(p, path!("a[0]"));
    }
}
