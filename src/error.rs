//! Typed error variants for the geometry kernel and the packing pipeline.
//!
//! Per the core contract there is no exception-based control flow: every
//! fallible geometry operation returns a `Result<_, GeomErr>` and the
//! selectors surface `PackErr` only at the boundaries where a caller needs
//! to know (an item could not be placed anywhere, or the run was cancelled).

use std::fmt;

/// Failure modes of the geometry kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomErr {
    /// NFP construction failed on a degenerate input (fewer than three
    /// vertices, zero area, or a non-simple polygon).
    Nfp,
    /// Polygon union failed, typically on malformed inputs.
    Merge,
    /// Offsetting was refused because a ring has fewer than four vertices.
    Offset,
}

impl fmt::Display for GeomErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GeomErr::Nfp => "no-fit-polygon construction failed on a degenerate input",
            GeomErr::Merge => "polygon union failed",
            GeomErr::Offset => "offsetting refused: a ring has fewer than four vertices",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for GeomErr {}

/// Failure modes of the packing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackErr {
    /// An item cannot fit in an empty bin and was dropped from the work set.
    InfeasibleItem,
    /// The selector observed `stop_condition() == true`.
    Cancelled,
}

impl fmt::Display for PackErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PackErr::InfeasibleItem => "item cannot fit in an empty bin",
            PackErr::Cancelled => "packing run was cancelled",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for PackErr {}
