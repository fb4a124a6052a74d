//! Source locations attached to raw syntax trees.

use core::fmt::{self, Display};

/// Position of a node in the source, together with the exact source text it spans.
///
/// Locations are produced by the parser and reused verbatim in diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
    pub txt: String,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize, txt: impl Into<String>) -> Self {
        let txt = txt.into();
        Self { line, col, txt }
    }

    /// Return true if the located text spans multiple lines.
    pub fn is_multiline(&self) -> bool {
        self.txt.contains('\n')
    }
}

impl Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
