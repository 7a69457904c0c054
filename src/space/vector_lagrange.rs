use crate::mesh::TriangleMesh2d;
use crate::space::{FiniteElementSpace, VectorFiniteElementSpace};
use nalgebra::{Point2, Vector2};

/// Continuous piecewise linear vector fields.
///
/// Degrees of freedom are blocked by component: the degree of freedom of component `c` at vertex
/// `v` has index `c * num_vertices + v`. Local element degrees of freedom follow the same
/// ordering, with the three vertex functions of the first component first.
#[derive(Debug, Copy, Clone)]
pub struct VectorLagrangeSpace<'a> {
    mesh: &'a TriangleMesh2d,
}

impl<'a> VectorLagrangeSpace<'a> {
    pub fn new(mesh: &'a TriangleMesh2d) -> Self {
        Self { mesh }
    }
}

impl<'a> FiniteElementSpace for VectorLagrangeSpace<'a> {
    fn mesh(&self) -> &TriangleMesh2d {
        self.mesh
    }

    fn num_dofs(&self) -> usize {
        2 * self.mesh.num_vertices()
    }

    fn element_dof_count(&self) -> usize {
        6
    }

    fn populate_element_dofs(&self, element_index: usize, dofs: &mut [usize]) {
        let nv = self.mesh.num_vertices();
        let vertices = &self.mesh.connectivity()[element_index].0;
        for (local_dof, dof) in dofs.iter_mut().enumerate() {
            *dof = (local_dof / 3) * nv + vertices[local_dof % 3];
        }
    }

    fn essential_dofs(&self) -> Vec<usize> {
        Vec::new()
    }
}

impl<'a> VectorFiniteElementSpace for VectorLagrangeSpace<'a> {
    fn populate_element_vector_basis(
        &self,
        element_index: usize,
        basis_values: &mut [Vector2<f64>],
        reference_coords: &Point2<f64>,
    ) {
        let phi = self
            .mesh
            .element(element_index)
            .evaluate_basis(reference_coords);
        for (local_dof, value) in basis_values.iter_mut().enumerate() {
            let mut v = Vector2::zeros();
            v[local_dof / 3] = phi[local_dof % 3];
            *value = v;
        }
    }

    fn populate_element_divergence(&self, element_index: usize, divergence: &mut [f64], reference_coords: &Point2<f64>) {
        let g = self
            .mesh
            .element(element_index)
            .physical_gradients(reference_coords)
            .expect("Mesh elements must not be degenerate");
        for (local_dof, div) in divergence.iter_mut().enumerate() {
            *div = g[(local_dof / 3, local_dof % 3)];
        }
    }
}
