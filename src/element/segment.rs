use nalgebra::Vector2;

/// Linear basis functions on a line segment in one dimension, with reference domain [-1, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment1dElement {
    endpoints: [f64; 2],
}

impl Segment1dElement {
    pub fn from_endpoints(a: f64, b: f64) -> Self {
        Self { endpoints: [a, b] }
    }

    pub fn endpoints(&self) -> &[f64; 2] {
        &self.endpoints
    }

    pub fn evaluate_basis(&self, xi: f64) -> Vector2<f64> {
        Vector2::new(0.5 * (1.0 - xi), 0.5 * (1.0 + xi))
    }

    /// Derivatives of the basis functions with respect to the physical coordinate.
    pub fn physical_derivatives(&self) -> Vector2<f64> {
        let length = self.length();
        Vector2::new(-1.0 / length, 1.0 / length)
    }

    pub fn reference_jacobian(&self) -> f64 {
        0.5 * self.length()
    }

    pub fn map_reference_coords(&self, xi: f64) -> f64 {
        let [a, b] = self.endpoints;
        0.5 * (1.0 - xi) * a + 0.5 * (1.0 + xi) * b
    }

    pub fn length(&self) -> f64 {
        self.endpoints[1] - self.endpoints[0]
    }
}
