use crate::mesh::TriangleMesh2d;
use crate::space::{FiniteElementSpace, ScalarFiniteElementSpace};
use nalgebra::{Point2, Vector2};

/// Continuous piecewise linear scalar functions, with one degree of freedom per mesh vertex.
#[derive(Debug, Copy, Clone)]
pub struct LagrangeSpace<'a> {
    mesh: &'a TriangleMesh2d,
}

impl<'a> LagrangeSpace<'a> {
    pub fn new(mesh: &'a TriangleMesh2d) -> Self {
        Self { mesh }
    }
}

impl<'a> FiniteElementSpace for LagrangeSpace<'a> {
    fn mesh(&self) -> &TriangleMesh2d {
        self.mesh
    }

    fn num_dofs(&self) -> usize {
        self.mesh.num_vertices()
    }

    fn element_dof_count(&self) -> usize {
        3
    }

    fn populate_element_dofs(&self, element_index: usize, dofs: &mut [usize]) {
        dofs.copy_from_slice(&self.mesh.connectivity()[element_index].0);
    }

    fn essential_dofs(&self) -> Vec<usize> {
        self.mesh.find_boundary_vertices()
    }
}

impl<'a> ScalarFiniteElementSpace for LagrangeSpace<'a> {
    fn populate_element_basis(&self, element_index: usize, basis_values: &mut [f64], reference_coords: &Point2<f64>) {
        let phi = self
            .mesh
            .element(element_index)
            .evaluate_basis(reference_coords);
        basis_values.copy_from_slice(phi.as_slice());
    }

    fn populate_element_gradients(
        &self,
        element_index: usize,
        gradients: &mut [Vector2<f64>],
        reference_coords: &Point2<f64>,
    ) {
        let element = self.mesh.element(element_index);
        let g = element
            .physical_gradients(reference_coords)
            .expect("Mesh elements must not be degenerate");
        for (k, gradient) in gradients.iter_mut().enumerate() {
            *gradient = g.column(k).into_owned();
        }
    }
}
