use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordered set of 1-based line numbers.
///
/// Values are strictly increasing and unique by construction. Line `0` does not
/// exist and is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct LineSet(BTreeSet<u32>);

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `line`. Returns false for `0` or for a line already present.
    pub fn insert(&mut self, line: u32) -> bool {
        line != 0 && self.0.insert(line)
    }

    pub fn contains(&self, line: u32) -> bool {
        self.0.contains(&line)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ascending iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u32> + ExactSizeIterator + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for LineSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|l| *l != 0).collect())
    }
}

/// Rejects line `0`; unsorted or repeated input is normalized.
impl TryFrom<Vec<u32>> for LineSet {
    type Error = String;

    fn try_from(lines: Vec<u32>) -> Result<Self, Self::Error> {
        if lines.contains(&0) {
            return Err("line numbers start at 1".to_string());
        }
        Ok(Self(lines.into_iter().collect()))
    }
}

impl From<LineSet> for Vec<u32> {
    fn from(set: LineSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl<const N: usize> From<[u32; N]> for LineSet {
    fn from(lines: [u32; N]) -> Self {
        lines.into_iter().collect()
    }
}

/// Which lines of a file are in scope for fixing and linting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "lines")]
pub enum LineScope {
    /// Every line; no filtering.
    All,
    /// Exactly these lines. An empty set means nothing changed.
    Lines(LineSet),
}

impl LineScope {
    /// The scope of a file that is present but has no changed lines.
    pub fn nothing() -> Self {
        LineScope::Lines(LineSet::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, LineScope::All)
    }

    pub fn contains(&self, line: u32) -> bool {
        match self {
            LineScope::All => true,
            LineScope::Lines(set) => set.contains(line),
        }
    }

    pub fn lines(&self) -> Option<&LineSet> {
        match self {
            LineScope::All => None,
            LineScope::Lines(set) => Some(set),
        }
    }
}

impl From<LineSet> for LineScope {
    fn from(set: LineSet) -> Self {
        LineScope::Lines(set)
    }
}

/// Closed interval `[start, end]` of 1-based lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineRange {
    start: u32,
    end: u32,
}

impl LineRange {
    /// Returns `None` unless `1 <= start <= end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start >= 1 && start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Renders as `start-end`, the form substituted into fixer arguments.
impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
