//! Uniform (red) refinement of triangle meshes.
use crate::connectivity::TriangleConnectivity;
use crate::mesh::TriangleMesh2d;
use nalgebra::{center, Point2};

/// Refines every triangle into four congruent triangles through its edge midpoints.
///
/// The vertices of the refined mesh are the original vertices followed by one midpoint per edge
/// of the original mesh, in edge order. The four children of element `e` are the elements
/// `4e, ..., 4e + 3` of the refined mesh, so every child is nested in its parent.
pub fn refine_uniformly(mesh: &TriangleMesh2d) -> TriangleMesh2d {
    let num_vertices = mesh.num_vertices();
    let mut vertices: Vec<Point2<f64>> = mesh.vertices().to_vec();
    vertices.extend(
        mesh.edges()
            .iter()
            .map(|edge| center(&mesh.vertices()[edge.0[0]], &mesh.vertices()[edge.0[1]])),
    );

    let mut connectivity = Vec::with_capacity(4 * mesh.num_elements());
    for (element_idx, conn) in mesh.connectivity().iter().enumerate() {
        let [a, b, c] = conn.0;
        // Midpoint opposite to each local vertex
        let edges = *mesh.element_edges(element_idx);
        let [m_a, m_b, m_c] = edges.map(|edge_idx| num_vertices + edge_idx);
        connectivity.push(TriangleConnectivity([a, m_c, m_b]));
        connectivity.push(TriangleConnectivity([m_c, b, m_a]));
        connectivity.push(TriangleConnectivity([m_b, m_a, c]));
        connectivity.push(TriangleConnectivity([m_a, m_b, m_c]));
    }

    TriangleMesh2d::from_vertices_and_connectivity(vertices, connectivity)
}

/// Returns the sequence of meshes obtained by refining `coarse` uniformly `num_refinements` times,
/// starting with `coarse` itself.
pub fn refine_uniformly_repeatedly(coarse: TriangleMesh2d, num_refinements: usize) -> Vec<TriangleMesh2d> {
    let mut meshes = Vec::with_capacity(num_refinements + 1);
    meshes.push(coarse);
    for _ in 0..num_refinements {
        let finer = refine_uniformly(meshes.last().expect("Sequence is never empty"));
        meshes.push(finer);
    }
    meshes
}
