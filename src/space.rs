//! Finite element spaces on triangle meshes.
//!
//! A space borrows the mesh it is defined on and provides the degrees of freedom of each element
//! along with basis function evaluation at reference coordinates of that element.
use crate::mesh::TriangleMesh2d;
use nalgebra::{Point2, Vector2};
use std::fmt::Debug;

mod lagrange;
mod raviart_thomas;
mod vector_lagrange;

pub use lagrange::*;
pub use raviart_thomas::*;
pub use vector_lagrange::*;

pub trait FiniteElementSpace: Debug {
    fn mesh(&self) -> &TriangleMesh2d;

    fn num_dofs(&self) -> usize;

    fn num_elements(&self) -> usize {
        self.mesh().num_elements()
    }

    /// Number of degrees of freedom associated with each element.
    fn element_dof_count(&self) -> usize;

    /// Writes the global indices of the degrees of freedom of the given element into `dofs`,
    /// which must have length `element_dof_count()`.
    fn populate_element_dofs(&self, element_index: usize, dofs: &mut [usize]);

    /// Global degrees of freedom subject to homogeneous essential boundary conditions.
    fn essential_dofs(&self) -> Vec<usize>;
}

/// A space of scalar-valued functions with square-integrable gradients.
pub trait ScalarFiniteElementSpace: FiniteElementSpace {
    /// Evaluates the element basis functions at the given reference coordinates.
    fn populate_element_basis(&self, element_index: usize, basis_values: &mut [f64], reference_coords: &Point2<f64>);

    /// Evaluates the physical gradients of the element basis functions at the given reference
    /// coordinates.
    fn populate_element_gradients(
        &self,
        element_index: usize,
        gradients: &mut [Vector2<f64>],
        reference_coords: &Point2<f64>,
    );
}

/// A space of vector-valued functions with square-integrable divergence.
pub trait VectorFiniteElementSpace: FiniteElementSpace {
    /// Evaluates the element basis functions at the given reference coordinates.
    fn populate_element_vector_basis(
        &self,
        element_index: usize,
        basis_values: &mut [Vector2<f64>],
        reference_coords: &Point2<f64>,
    );

    /// Evaluates the divergence of the element basis functions at the given reference coordinates.
    fn populate_element_divergence(&self, element_index: usize, divergence: &mut [f64], reference_coords: &Point2<f64>);
}

impl<S> FiniteElementSpace for Box<S>
where
    S: ?Sized + FiniteElementSpace,
{
    fn mesh(&self) -> &TriangleMesh2d {
        S::mesh(self)
    }

    fn num_dofs(&self) -> usize {
        S::num_dofs(self)
    }

    fn element_dof_count(&self) -> usize {
        S::element_dof_count(self)
    }

    fn populate_element_dofs(&self, element_index: usize, dofs: &mut [usize]) {
        S::populate_element_dofs(self, element_index, dofs)
    }

    fn essential_dofs(&self) -> Vec<usize> {
        S::essential_dofs(self)
    }
}

impl<S> VectorFiniteElementSpace for Box<S>
where
    S: ?Sized + VectorFiniteElementSpace,
{
    fn populate_element_vector_basis(
        &self,
        element_index: usize,
        basis_values: &mut [Vector2<f64>],
        reference_coords: &Point2<f64>,
    ) {
        S::populate_element_vector_basis(self, element_index, basis_values, reference_coords)
    }

    fn populate_element_divergence(&self, element_index: usize, divergence: &mut [f64], reference_coords: &Point2<f64>) {
        S::populate_element_divergence(self, element_index, divergence, reference_coords)
    }
}
