//! Loc - Source location tracking for AST nodes and diagnostics
//!
//! A `Loc` represents a range of source code as a pair of line/column
//! positions, matching the `loc` objects the external parser attaches to
//! every AST node. It is used for:
//! - Tracking the location of AST nodes
//! - Pointing to error locations in diagnostics
//! - Deriving stable scope keys for the module scope graph
//!
//! Locs are small (16 bytes) and cheap to copy.

use serde::{Deserialize, Serialize};

/// A position in source text. Lines are 1-based, columns 0-based,
/// following the convention of the upstream parser.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A range of source code, represented as a start/end position pair.
///
/// Locs use half-open intervals: `[start, end)`.
/// An empty loc has `start == end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub start: Position,
    pub end: Position,
}

impl Loc {
    /// Create a new loc from start and end positions.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Loc { start, end }
    }

    /// Create a loc spanning a single line from `start_col` to `end_col`.
    #[inline]
    pub const fn on_line(line: u32, start_col: u32, end_col: u32) -> Self {
        Loc {
            start: Position::new(line, start_col),
            end: Position::new(line, end_col),
        }
    }

    /// Create an empty loc at the given position.
    #[inline]
    pub const fn at(pos: Position) -> Self {
        Loc {
            start: pos,
            end: pos,
        }
    }

    /// Create a dummy/invalid loc (used for synthetic nodes).
    #[inline]
    pub const fn dummy() -> Self {
        Loc {
            start: Position::new(u32::MAX, u32::MAX),
            end: Position::new(u32::MAX, u32::MAX),
        }
    }

    /// Check if this is a dummy/invalid loc.
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.start.line == u32::MAX
    }

    /// Check if this loc is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this loc contains a position.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Check if this loc contains another loc.
    #[inline]
    pub fn contains_loc(&self, other: Loc) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Merge two locs to create a loc covering both.
    #[inline]
    pub fn merge(&self, other: Loc) -> Loc {
        Loc {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// =============================================================================
// Located Trait
// =============================================================================

/// A trait for types that carry a source loc.
pub trait Located {
    /// Get the source loc of this element.
    fn loc(&self) -> Loc;

    /// Get the start position.
    fn start(&self) -> Position {
        self.loc().start
    }

    /// Get the end position.
    fn end(&self) -> Position {
        self.loc().end
    }
}

impl Located for Loc {
    fn loc(&self) -> Loc {
        *self
    }
}
