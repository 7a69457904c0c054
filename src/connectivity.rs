//! Cell connectivity of two-dimensional triangle meshes.
use serde::{Deserialize, Serialize};

pub trait Connectivity: Clone {
    type FaceConnectivity: Connectivity;

    fn num_faces(&self) -> usize;
    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity>;

    fn vertex_indices(&self) -> &[usize];
}

impl Connectivity for () {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        const EMPTY_SLICE: &[usize] = &[];
        EMPTY_SLICE
    }
}

/// Connectivity of a straight edge between two vertices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeConnectivity(pub [usize; 2]);

impl EdgeConnectivity {
    /// Returns the edge with its vertices ordered by increasing index.
    ///
    /// The ordered edge defines the global orientation of the edge, which runs from the lower
    /// to the higher vertex index.
    pub fn sorted(&self) -> Self {
        let [a, b] = self.0;
        Self([a.min(b), a.max(b)])
    }
}

impl Connectivity for EdgeConnectivity {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

/// Connectivity of a linear triangle with counter-clockwise vertex ordering.
///
/// Local face (edge) `k` is the edge opposite to local vertex `k`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriangleConnectivity(pub [usize; 3]);

impl Connectivity for TriangleConnectivity {
    type FaceConnectivity = EdgeConnectivity;

    fn num_faces(&self) -> usize {
        3
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let idx = &self.0;
        if index < 3 {
            Some(EdgeConnectivity([idx[(index + 1) % 3], idx[(index + 2) % 3]]))
        } else {
            None
        }
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}
