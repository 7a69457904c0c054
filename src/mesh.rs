//! Unstructured triangle meshes in two dimensions.
use crate::connectivity::{Connectivity, EdgeConnectivity, TriangleConnectivity};
use crate::element::Tri3d2Element;
use nalgebra::Point2;
use rustc_hash::FxHashMap;

pub mod procedural;
pub mod refinement;

/// A triangle mesh together with derived vertex/edge adjacency information.
///
/// The derived data is computed once on construction, and the mesh is immutable afterwards.
/// Edges are numbered in the order in which they are first encountered when traversing
/// elements and their local edges.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh2d {
    vertices: Vec<Point2<f64>>,
    connectivity: Vec<TriangleConnectivity>,
    vertex_elements: Vec<Vec<usize>>,
    edges: Vec<EdgeConnectivity>,
    element_edges: Vec<[usize; 3]>,
    edge_element_counts: Vec<usize>,
}

impl TriangleMesh2d {
    /// Constructs a mesh from vertices and counter-clockwise oriented triangles.
    ///
    /// # Panics
    ///
    /// Panics if a vertex index is out of bounds.
    pub fn from_vertices_and_connectivity(vertices: Vec<Point2<f64>>, connectivity: Vec<TriangleConnectivity>) -> Self {
        let mut vertex_elements = vec![Vec::new(); vertices.len()];
        for (element_idx, conn) in connectivity.iter().enumerate() {
            for &v in conn.vertex_indices() {
                assert!(v < vertices.len(), "Vertex index {} out of bounds", v);
                vertex_elements[v].push(element_idx);
            }
        }

        let mut edge_map = FxHashMap::default();
        let mut edges = Vec::new();
        let mut edge_element_counts = Vec::new();
        let mut element_edges = Vec::with_capacity(connectivity.len());
        for conn in &connectivity {
            let mut local_edges = [0; 3];
            for (k, local_edge) in local_edges.iter_mut().enumerate() {
                let edge = conn
                    .get_face_connectivity(k)
                    .expect("Triangles always have three faces")
                    .sorted();
                let edge_idx = *edge_map.entry(edge).or_insert_with(|| {
                    edges.push(edge);
                    edge_element_counts.push(0);
                    edges.len() - 1
                });
                edge_element_counts[edge_idx] += 1;
                *local_edge = edge_idx;
            }
            element_edges.push(local_edges);
        }

        Self {
            vertices,
            connectivity,
            vertex_elements,
            edges,
            element_edges,
            edge_element_counts,
        }
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[TriangleConnectivity] {
        &self.connectivity
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Returns the geometric element with the given index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn element(&self, index: usize) -> Tri3d2Element {
        let [a, b, c] = self.connectivity[index].0;
        Tri3d2Element::from_vertices([self.vertices[a], self.vertices[b], self.vertices[c]])
    }

    pub fn element_iter(&self) -> impl '_ + Iterator<Item = Tri3d2Element> {
        (0..self.num_elements()).map(move |i| self.element(i))
    }

    pub fn element_centroid(&self, index: usize) -> Point2<f64> {
        self.element(index).centroid()
    }

    /// Elements incident to the given vertex, in increasing order.
    pub fn vertex_elements(&self, vertex_index: usize) -> &[usize] {
        &self.vertex_elements[vertex_index]
    }

    /// Unique edges of the mesh, each oriented from the lower to the higher vertex index.
    pub fn edges(&self) -> &[EdgeConnectivity] {
        &self.edges
    }

    /// Global indices of the three edges of an element. Local edge `k` is opposite local vertex `k`.
    pub fn element_edges(&self, element_index: usize) -> &[usize; 3] {
        &self.element_edges[element_index]
    }

    /// Finds edges which are only connected to exactly one element, in increasing order.
    pub fn find_boundary_edges(&self) -> Vec<usize> {
        self.edge_element_counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count == 1)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Returns a sorted list of vertices that are determined to be on the boundary.
    ///
    /// A vertex is considered to be a part of the boundary if it belongs to a boundary edge.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut indices: Vec<_> = self
            .find_boundary_edges()
            .into_iter()
            .flat_map(|edge_idx| self.edges[edge_idx].0)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Maximum element diameter.
    pub fn mesh_size(&self) -> f64 {
        self.element_iter()
            .map(|element| element.diameter())
            .fold(0.0, f64::max)
    }
}
