//! Assembly of bilinear forms and load vectors over nested hierarchies.
//!
//! Local (element-level) integrators live in [`local`], while [`global`] drives them over all
//! elements and level pairs of a hierarchy to produce block matrices.
pub mod global;
pub mod local;
pub mod source;
