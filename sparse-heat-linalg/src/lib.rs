//! Sparse linear algebra used by the space-time discretization.
//!
//! The routines here fill gaps in `nalgebra-sparse` that the assembly of block-structured
//! space-time systems needs: Kronecker products, scaled sums, symmetric elimination
//! of rows and columns and a preconditioned Conjugate Gradient solver.
pub mod cg;
pub mod ops;

pub use nalgebra_sparse::{CooMatrix, CsrMatrix};
