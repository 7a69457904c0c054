use itertools::Itertools;
use nalgebra::{distance, Matrix1x3, Matrix2, Matrix2x3, Point2, Vector2};

/// Relative tolerance used when deciding whether a point lies inside a triangle.
pub const CONTAINMENT_TOLERANCE: f64 = 1e-12;

/// A finite element representing linear basis functions on a triangle, in two dimensions.
///
/// The reference element is chosen to be the triangle defined by the corners
/// (-1, -1), (1, -1), (-1, 1). This perhaps unorthodox choice is due to the quadrature rules
/// we employ.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tri3d2Element {
    vertices: [Point2<f64>; 3],
}

impl Tri3d2Element {
    pub fn from_vertices(vertices: [Point2<f64>; 3]) -> Self {
        Self { vertices }
    }

    pub fn reference() -> Self {
        Self::from_vertices([Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)])
    }

    pub fn vertices(&self) -> &[Point2<f64>; 3] {
        &self.vertices
    }

    #[rustfmt::skip]
    pub fn evaluate_basis(&self, xi: &Point2<f64>) -> Matrix1x3<f64> {
        Matrix1x3::from_row_slice(&[
            -0.5 * xi.x - 0.5 * xi.y,
            0.5 * xi.x + 0.5,
            0.5 * xi.y + 0.5
        ])
    }

    /// Gradients of the basis functions with respect to reference coordinates, stored column-wise.
    #[rustfmt::skip]
    pub fn gradients(&self, _xi: &Point2<f64>) -> Matrix2x3<f64> {
        Matrix2x3::from_columns(&[
            Vector2::new(-0.5, -0.5),
            Vector2::new(0.5, 0.0),
            Vector2::new(0.0, 0.5)
        ])
    }

    #[allow(non_snake_case)]
    pub fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        let X: Matrix2x3<f64> = Matrix2x3::from_fn(|i, j| self.vertices[j][i]);
        let G = self.gradients(xi);
        X * G.transpose()
    }

    #[allow(non_snake_case)]
    pub fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64> {
        let X: Matrix2x3<f64> = Matrix2x3::from_fn(|i, j| self.vertices[j][i]);
        let N = self.evaluate_basis(xi);
        Point2::from(X * N.transpose())
    }

    /// Gradients of the basis functions with respect to physical coordinates, stored column-wise.
    ///
    /// Returns `None` if the element is degenerate.
    #[allow(non_snake_case)]
    pub fn physical_gradients(&self, xi: &Point2<f64>) -> Option<Matrix2x3<f64>> {
        let J = self.reference_jacobian(xi);
        let J_inv_t = J.try_inverse()?.transpose();
        Some(J_inv_t * self.gradients(xi))
    }

    /// Maps a physical point to reference coordinates.
    ///
    /// Returns the reference coordinates together with a flag indicating whether the point lies
    /// inside the element, up to a tolerance relative to the unit barycentric range. Returns
    /// `None` if the element is degenerate.
    #[allow(non_snake_case)]
    pub fn map_physical_coords(&self, x: &Point2<f64>) -> Option<(Point2<f64>, bool)> {
        // The map is affine, so the Jacobian is constant and the vertex 0 maps from (-1, -1)
        let J = self.reference_jacobian(&Point2::origin());
        let J_inv = J.try_inverse()?;
        let xi = Point2::new(-1.0, -1.0) + J_inv * (x - self.vertices[0]);
        let inside = reference_barycentric_coords(&xi)
            .iter()
            .all(|&lambda| lambda >= -CONTAINMENT_TOLERANCE);
        Some((xi, inside))
    }

    /// Barycentric coordinates of a physical point with respect to the vertices.
    pub fn barycentric_coords(&self, x: &Point2<f64>) -> Option<[f64; 3]> {
        self.map_physical_coords(x)
            .map(|(xi, _)| reference_barycentric_coords(&xi))
    }

    pub fn contains_point(&self, x: &Point2<f64>) -> bool {
        self.map_physical_coords(x)
            .map(|(_, inside)| inside)
            .unwrap_or(false)
    }

    pub fn centroid(&self) -> Point2<f64> {
        let [a, b, c] = &self.vertices;
        Point2::from((a.coords + b.coords + c.coords) / 3.0)
    }

    pub fn area(&self) -> f64 {
        let [a, b, c] = &self.vertices;
        let ab = b - a;
        let ac = c - a;
        0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
    }

    pub fn diameter(&self) -> f64 {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(0.0, f64::max)
    }
}

/// Barycentric coordinates of a point given in reference coordinates.
pub fn reference_barycentric_coords(xi: &Point2<f64>) -> [f64; 3] {
    let l1 = 0.5 * (xi.x + 1.0);
    let l2 = 0.5 * (xi.y + 1.0);
    [1.0 - l1 - l2, l1, l2]
}

/// Reference coordinates of a point given in barycentric coordinates.
pub fn reference_coords_from_barycentric(lambda: &[f64; 3]) -> Point2<f64> {
    Point2::new(2.0 * lambda[1] - 1.0, 2.0 * lambda[2] - 1.0)
}
