//! The table of delimiter pairs the matcher tracks.
//!
//! Every character in the table has exactly one role. A table where a
//! character is both an opener and a closer (for example `"` used for both
//! ends of a string) is refused at construction, so the scanners never have
//! to guess which direction to search in.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// One `(open, close)` pairing, e.g. `(` and `)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelimiterPair {
    pub open: char,
    pub close: char,
}

impl DelimiterPair {
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }
}

impl From<(char, char)> for DelimiterPair {
    fn from((open, close): (char, char)) -> Self {
        Self::new(open, close)
    }
}

/// Parentheses, brackets and braces.
pub const DEFAULT_PAIRS: [DelimiterPair; 3] = [
    DelimiterPair::new('(', ')'),
    DelimiterPair::new('[', ']'),
    DelimiterPair::new('{', '}'),
];

/// An ordered, validated set of delimiter pairs.
///
/// Lookups are a linear scan; tables hold a handful of pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterTable {
    pairs: Vec<DelimiterPair>,
}

impl DelimiterTable {
    /// Builds a table, rejecting any character used in more than one role.
    ///
    /// An empty list is legal; such a table never matches anything.
    pub fn new<I, P>(pairs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<DelimiterPair>,
    {
        let pairs: Vec<DelimiterPair> = pairs.into_iter().map(Into::into).collect();

        let mut seen: Vec<char> = Vec::with_capacity(pairs.len() * 2);
        for pair in &pairs {
            for c in [pair.open, pair.close] {
                if seen.contains(&c) {
                    return Err(CoreError::OverlappingDelimiter(c));
                }
                seen.push(c);
            }
        }

        Ok(Self { pairs })
    }

    /// A table that tracks nothing.
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn pairs(&self) -> &[DelimiterPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_open(&self, c: char) -> bool {
        self.pairs.iter().any(|pair| pair.open == c)
    }

    pub fn is_close(&self, c: char) -> bool {
        self.pairs.iter().any(|pair| pair.close == c)
    }

    /// Closing character for an opener.
    pub fn close_of(&self, open: char) -> CoreResult<char> {
        self.pairs
            .iter()
            .find(|pair| pair.open == open)
            .map(|pair| pair.close)
            .ok_or(CoreError::DelimiterNotFound(open))
    }

    /// Opening character for a closer.
    pub fn open_of(&self, close: char) -> CoreResult<char> {
        self.pairs
            .iter()
            .find(|pair| pair.close == close)
            .map(|pair| pair.open)
            .ok_or(CoreError::DelimiterNotFound(close))
    }
}

impl Default for DelimiterTable {
    fn default() -> Self {
        Self {
            pairs: DEFAULT_PAIRS.to_vec(),
        }
    }
}
