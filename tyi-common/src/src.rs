use std::{fmt, ops::Range};

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Loc(pub usize);

impl From<usize> for Loc {
    fn from(loc: usize) -> Self { Loc(loc) }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Byte range in the source that produced a type or a constraint
///
/// Spans are only ever used for diagnostics
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Span {
    None,
    Range(Loc, Loc),
}

impl Span {
    pub fn single(loc: impl Into<Loc>) -> Self {
        let loc = loc.into();
        Span::Range(loc, Loc(loc.0 + 1))
    }

    pub fn range(start: impl Into<Loc>, end: impl Into<Loc>) -> Self {
        Span::Range(start.into(), end.into())
    }

    pub fn is_none(&self) -> bool { matches!(self, Span::None) }

    pub fn as_range(&self) -> Option<Range<usize>> {
        match self {
            Span::None => None,
            Span::Range(start, end) => Some(start.0..end.0),
        }
    }
}

impl Default for Span {
    fn default() -> Self { Span::None }
}
