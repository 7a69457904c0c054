//! Locating physical points in the elements of a triangle mesh.
use crate::mesh::TriangleMesh2d;
use core::fmt;
use nalgebra::{distance_squared, Point2};
use ordered_float::OrderedFloat;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::error::Error;

/// Vertices closer than this distance are considered geometrically identical.
pub const SHARED_VERTEX_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub enum LocateError {
    /// No element of the mesh contains the point.
    PointNotFound { point: Point2<f64> },
    /// The initial guess is not a valid element index.
    InvalidGuess { guess: usize, num_elements: usize },
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointNotFound { point } => {
                write!(f, "point ({}, {}) is not contained in any element", point.x, point.y)
            }
            Self::InvalidGuess { guess, num_elements } => write!(
                f,
                "initial guess {} is out of bounds for mesh with {} elements",
                guess, num_elements
            ),
        }
    }
}

impl Error for LocateError {}

/// Finds the element containing a point by walking through the mesh from an initial guess.
///
/// From the current element, the search moves to the vertex-adjacent element whose centroid is
/// closest to the query point, as long as this strictly decreases the distance. When no such
/// neighbour exists, all vertex-adjacent elements are tested for containment. As a last resort,
/// all elements of the mesh are tested.
#[derive(Debug, Clone)]
pub struct PointLocator<'a> {
    mesh: &'a TriangleMesh2d,
    // For each vertex, the geometrically identical vertices (including itself)
    shared_vertices: Option<Vec<Vec<usize>>>,
}

impl<'a> PointLocator<'a> {
    pub fn new(mesh: &'a TriangleMesh2d) -> Self {
        Self {
            mesh,
            shared_vertices: None,
        }
    }

    /// Creates a locator which also treats elements incident to geometrically identical vertices
    /// as neighbours.
    ///
    /// This is needed for meshes in which vertices on internal interfaces are duplicated, since
    /// the connectivity then does not link elements across the interface.
    pub fn with_shared_vertices(mesh: &'a TriangleMesh2d) -> Self {
        let tree = RTree::bulk_load(
            mesh.vertices()
                .iter()
                .enumerate()
                .map(|(idx, v)| GeomWithData::new([v.x, v.y], idx))
                .collect(),
        );
        let tol_squared = SHARED_VERTEX_TOLERANCE * SHARED_VERTEX_TOLERANCE;
        let shared_vertices = mesh
            .vertices()
            .iter()
            .map(|v| {
                let mut equivalent: Vec<usize> = tree
                    .locate_within_distance([v.x, v.y], tol_squared)
                    .map(|entry| entry.data)
                    .collect();
                equivalent.sort_unstable();
                equivalent
            })
            .collect();
        Self {
            mesh,
            shared_vertices: Some(shared_vertices),
        }
    }

    pub fn mesh(&self) -> &TriangleMesh2d {
        self.mesh
    }

    /// Elements sharing at least one vertex with the given element, excluding the element itself.
    pub fn vertex_neighbours(&self, element_index: usize) -> Vec<usize> {
        let mut neighbours = Vec::new();
        for &v in &self.mesh.connectivity()[element_index].0 {
            match &self.shared_vertices {
                Some(table) => {
                    for &w in &table[v] {
                        neighbours.extend_from_slice(self.mesh.vertex_elements(w));
                    }
                }
                None => neighbours.extend_from_slice(self.mesh.vertex_elements(v)),
            }
        }
        neighbours.sort_unstable();
        neighbours.dedup();
        neighbours.retain(|&e| e != element_index);
        neighbours
    }

    fn try_element(&self, element_index: usize, point: &Point2<f64>) -> Option<(usize, Point2<f64>)> {
        match self.mesh.element(element_index).map_physical_coords(point) {
            Some((xi, true)) => Some((element_index, xi)),
            _ => None,
        }
    }

    /// Returns the element containing the point and the reference coordinates of the point in
    /// that element.
    pub fn locate_point(&self, point: &Point2<f64>, initial_guess: usize) -> Result<(usize, Point2<f64>), LocateError> {
        let num_elements = self.mesh.num_elements();
        if initial_guess >= num_elements {
            return Err(LocateError::InvalidGuess {
                guess: initial_guess,
                num_elements,
            });
        }

        let centroid_distance = |e: usize| OrderedFloat(distance_squared(&self.mesh.element_centroid(e), point));

        let mut current = initial_guess;
        let mut current_distance = centroid_distance(current);
        // Every step strictly decreases the distance, so no element is visited twice
        for _ in 0..num_elements {
            if let Some(result) = self.try_element(current, point) {
                return Ok(result);
            }

            let neighbours = self.vertex_neighbours(current);
            let closest = neighbours
                .iter()
                .map(|&e| (centroid_distance(e), e))
                .min();

            match closest {
                Some((dist, e)) if dist < current_distance => {
                    current = e;
                    current_distance = dist;
                }
                _ => {
                    if let Some(result) = neighbours
                        .iter()
                        .find_map(|&e| self.try_element(e, point))
                    {
                        return Ok(result);
                    }
                    break;
                }
            }
        }

        log::warn!(
            "Local search for point ({}, {}) got stuck at element {}, falling back to global search",
            point.x,
            point.y,
            current
        );
        (0..num_elements)
            .find_map(|e| self.try_element(e, point))
            .ok_or(LocateError::PointNotFound { point: *point })
    }

    /// Locates a sequence of points, using the result for each point as the initial guess for
    /// the next.
    pub fn locate_points(
        &self,
        points: &[Point2<f64>],
        initial_guess: usize,
    ) -> Result<Vec<(usize, Point2<f64>)>, LocateError> {
        let mut guess = initial_guess;
        points
            .iter()
            .map(|point| {
                let result = self.locate_point(point, guess)?;
                guess = result.0;
                Ok(result)
            })
            .collect()
    }
}
