//! Sparse space-time least-squares finite elements for the heat equation.
//!
//! Temperature and heat flux are approximated on sparse tensor products of a hierarchical
//! piecewise linear basis in time with a hierarchy of nested triangle meshes in space. The crate
//! contains the finite element substrate on triangle meshes, cross-level block assembly over
//! nested hierarchies, closed-form temporal matrices, the space-time system builder and a
//! solver driver.
pub mod assembly;
pub mod block;
pub mod config;
pub mod connectivity;
pub mod discretisation;
pub mod element;
pub mod error;
pub mod hierarchy;
pub mod locate;
pub mod mesh;
pub mod problem;
pub mod quadrature;
pub mod solution;
pub mod solver;
pub mod space;
pub mod temporal;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
