//! Prolongation matrices between nested meshes, shared by the unit and integration tests.
use nalgebra::{DMatrix, Vector2};
use sparse_heat::locate::PointLocator;
use sparse_heat::mesh::TriangleMesh2d;
use sparse_heat::space::{FiniteElementSpace, RaviartThomasSpace, VectorFiniteElementSpace};

/// The matrix interpolating continuous piecewise linear functions on `coarse` at the vertices of
/// `fine`, which is exact when `fine` is nested in `coarse`.
pub fn p1_prolongation(coarse: &TriangleMesh2d, fine: &TriangleMesh2d) -> DMatrix<f64> {
    let locator = PointLocator::new(coarse);
    let mut prolongation = DMatrix::zeros(fine.num_vertices(), coarse.num_vertices());
    for (i, x) in fine.vertices().iter().enumerate() {
        let (element_index, xi) = locator
            .locate_point(x, 0)
            .expect("Fine vertices lie in the coarse mesh");
        let phi = coarse.element(element_index).evaluate_basis(&xi);
        for (k, &v) in coarse.connectivity()[element_index].0.iter().enumerate() {
            prolongation[(i, v)] = phi[k];
        }
    }
    prolongation
}

/// The matrix expressing lowest-order Raviart-Thomas functions on `coarse` in the basis on the
/// nested mesh `fine`, whose coefficients are the normal components on the fine edges.
pub fn rt_prolongation(coarse: &TriangleMesh2d, fine: &TriangleMesh2d) -> DMatrix<f64> {
    let coarse_space = RaviartThomasSpace::new(coarse);
    let locator = PointLocator::new(coarse);
    let mut prolongation = DMatrix::zeros(fine.num_edges(), coarse.num_edges());
    let mut coarse_dofs = [0; 3];
    let mut values = [Vector2::zeros(); 3];
    for f in 0..fine.num_elements() {
        let (parent, _) = locator.locate_point(&fine.element_centroid(f), 0).unwrap();
        coarse_space.populate_element_dofs(parent, &mut coarse_dofs);
        for &edge in fine.element_edges(f) {
            let [a, b] = fine.edges()[edge].0;
            let (a, b) = (fine.vertices()[a], fine.vertices()[b]);
            let d = b - a;
            let normal = Vector2::new(d.y, -d.x).normalize();
            let midpoint = nalgebra::center(&a, &b);
            let (xi, _) = coarse.element(parent).map_physical_coords(&midpoint).unwrap();
            coarse_space.populate_element_vector_basis(parent, &mut values, &xi);
            for (&dof, value) in coarse_dofs.iter().zip(&values) {
                prolongation[(edge, dof)] = value.dot(&normal);
            }
        }
    }
    prolongation
}

/// Prolongation of component-blocked continuous piecewise linear vector fields.
pub fn vector_p1_prolongation(coarse: &TriangleMesh2d, fine: &TriangleMesh2d) -> DMatrix<f64> {
    let p = p1_prolongation(coarse, fine);
    let (nf, nc) = p.shape();
    let mut prolongation = DMatrix::zeros(2 * nf, 2 * nc);
    prolongation.view_mut((0, 0), (nf, nc)).copy_from(&p);
    prolongation.view_mut((nf, nc), (nf, nc)).copy_from(&p);
    prolongation
}
