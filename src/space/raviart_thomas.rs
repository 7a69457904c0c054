use crate::mesh::TriangleMesh2d;
use crate::space::{FiniteElementSpace, VectorFiniteElementSpace};
use nalgebra::{distance, Point2, Vector2};

/// Lowest-order Raviart-Thomas space, with one normal-flux degree of freedom per mesh edge.
///
/// The basis function of local edge `k` (opposite local vertex `p_k`) is
/// `s_k |e_k| / (2 |T|) (x - p_k)`, which has unit normal component on edge `k` in the direction of the
/// global edge normal. The global normal of an edge running from vertex `a` to vertex `b`, with
/// `a < b`, is the vector `(dy, -dx)` with `(dx, dy) = b - a`, and `s_k = ±1` accounts for whether
/// it points out of the element.
///
/// Essential boundary conditions of the heat problem act on the temperature only, so the space
/// has no essential degrees of freedom.
#[derive(Debug, Clone)]
pub struct RaviartThomasSpace<'a> {
    mesh: &'a TriangleMesh2d,
    // Per element: s_k |e_k| / (2 |T|)
    scales: Vec<[f64; 3]>,
}

impl<'a> RaviartThomasSpace<'a> {
    pub fn new(mesh: &'a TriangleMesh2d) -> Self {
        let scales = (0..mesh.num_elements())
            .map(|element_idx| {
                let element = mesh.element(element_idx);
                let vertices = element.vertices();
                let area = element.area();
                let mut scales = [0.0; 3];
                for (k, scale) in scales.iter_mut().enumerate() {
                    let edge = &mesh.edges()[mesh.element_edges(element_idx)[k]];
                    let a = &mesh.vertices()[edge.0[0]];
                    let b = &mesh.vertices()[edge.0[1]];
                    let d = b - a;
                    let normal = Vector2::new(d.y, -d.x);
                    let midpoint = nalgebra::center(a, b);
                    let sign = normal.dot(&(midpoint - vertices[k])).signum();
                    *scale = sign * distance(a, b) / (2.0 * area);
                }
                scales
            })
            .collect();
        Self { mesh, scales }
    }

    /// Orientation sign of the basis function of local edge `k` in the given element.
    pub fn edge_sign(&self, element_index: usize, local_edge: usize) -> f64 {
        self.scales[element_index][local_edge].signum()
    }
}

impl<'a> FiniteElementSpace for RaviartThomasSpace<'a> {
    fn mesh(&self) -> &TriangleMesh2d {
        self.mesh
    }

    fn num_dofs(&self) -> usize {
        self.mesh.num_edges()
    }

    fn element_dof_count(&self) -> usize {
        3
    }

    fn populate_element_dofs(&self, element_index: usize, dofs: &mut [usize]) {
        dofs.copy_from_slice(self.mesh.element_edges(element_index));
    }

    fn essential_dofs(&self) -> Vec<usize> {
        Vec::new()
    }
}

impl<'a> VectorFiniteElementSpace for RaviartThomasSpace<'a> {
    fn populate_element_vector_basis(
        &self,
        element_index: usize,
        basis_values: &mut [Vector2<f64>],
        reference_coords: &Point2<f64>,
    ) {
        let element = self.mesh.element(element_index);
        let x = element.map_reference_coords(reference_coords);
        for (k, value) in basis_values.iter_mut().enumerate() {
            *value = (x - element.vertices()[k]) * self.scales[element_index][k];
        }
    }

    fn populate_element_divergence(&self, element_index: usize, divergence: &mut [f64], _reference_coords: &Point2<f64>) {
        for (k, div) in divergence.iter_mut().enumerate() {
            *div = 2.0 * self.scales[element_index][k];
        }
    }
}
