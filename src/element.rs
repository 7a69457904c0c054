//! Affine reference finite elements.
//!
//! The triangle element provides the geometry of every mesh cell, while the segment element is
//! only used for conventional (non-hierarchical) temporal assembly.

mod segment;
mod triangle;

pub use segment::*;
pub use triangle::*;
