//! Basic procedural mesh generation routines.
use crate::connectivity::TriangleConnectivity;
use crate::mesh::TriangleMesh2d;
use nalgebra::{Point2, Vector2};

pub fn create_unit_square_uniform_tri_mesh_2d(cells_per_dim: usize) -> TriangleMesh2d {
    create_rectangular_uniform_tri_mesh_2d(&Point2::origin(), &Vector2::new(1.0, 1.0), cells_per_dim, cells_per_dim)
}

/// Generates an axis-aligned rectangular mesh with the given lower-left corner and extents.
///
/// Each of the `cells_x * cells_y` rectangular cells is split into two triangles along its
/// diagonal from the lower-right to the upper-left corner. Vertices are numbered row by row,
/// starting at the lower-left corner.
pub fn create_rectangular_uniform_tri_mesh_2d(
    lower_left: &Point2<f64>,
    extents: &Vector2<f64>,
    cells_x: usize,
    cells_y: usize,
) -> TriangleMesh2d {
    if cells_x == 0 || cells_y == 0 {
        return TriangleMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let dx = extents.x / cells_x as f64;
    let dy = extents.y / cells_y as f64;
    let to_global_vertex_index = |i: usize, j: usize| (cells_x + 1) * j + i;

    let mut vertices = Vec::with_capacity((cells_x + 1) * (cells_y + 1));
    for j in 0..=cells_y {
        for i in 0..=cells_x {
            vertices.push(lower_left + Vector2::new(i as f64 * dx, j as f64 * dy));
        }
    }

    let mut cells = Vec::with_capacity(2 * cells_x * cells_y);
    for j in 0..cells_y {
        for i in 0..cells_x {
            let a = to_global_vertex_index(i, j);
            let b = to_global_vertex_index(i + 1, j);
            let c = to_global_vertex_index(i, j + 1);
            let d = to_global_vertex_index(i + 1, j + 1);
            cells.push(TriangleConnectivity([a, b, c]));
            cells.push(TriangleConnectivity([b, d, c]));
        }
    }

    TriangleMesh2d::from_vertices_and_connectivity(vertices, cells)
}
