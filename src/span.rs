//! Source position and span tracking.
//!
//! Every lexer line, AST node, and diagnostic carries a `Span` so that
//! errors and the source-view toggle can point back at the original text.

use serde::{Deserialize, Serialize};

/// A single point in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub byte_offset: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }

    pub const fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

/// A half-open range `[start, end)` over the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span at a single position, used for synthesized nodes
    /// (e.g. synthesized closes at EOF) that have no real source extent.
    pub const fn point(pos: Position) -> Self {
        Self::new(pos, pos)
    }

    pub fn merge(self, other: Span) -> Span {
        let start = if self.start.byte_offset <= other.start.byte_offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.byte_offset >= other.end.byte_offset {
            self.end
        } else {
            other.end
        };
        Span::new(start, end)
    }
}
