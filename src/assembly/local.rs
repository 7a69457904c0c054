use crate::mesh::TriangleMesh2d;
use crate::quadrature::total_order::triangle;
use crate::quadrature::{Quadrature, QuadraturePair2d};
use eyre::eyre;
use nalgebra::{DMatrixViewMut, Matrix2, Point2};

mod mass;
mod mixed;
mod stiffness;

pub use mass::*;
pub use mixed::*;
pub use stiffness::*;

/// Element integration for a symmetric bilinear form on a single space, across levels of a
/// nested hierarchy.
///
/// The output of both methods has one row per test (fine) element degree of freedom and one
/// column per trial (coarse) element degree of freedom.
pub trait BlockBilinearFormIntegrator<Space: ?Sized> {
    /// Assembles the local matrix of a single element, with test and trial functions from the same
    /// level.
    fn assemble_same_level(&self, space: &Space, element_index: usize, output: DMatrixViewMut<f64>)
        -> eyre::Result<()>;

    /// Assembles the local matrix pairing test functions of a fine element with trial functions of
    /// a coarse ancestor element.
    fn assemble_cross_level(
        &self,
        fine_space: &Space,
        fine_element: usize,
        coarse_space: &Space,
        coarse_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()>;
}

/// Element integration for a bilinear form with distinct trial and test spaces, across levels of
/// a nested hierarchy.
///
/// Outputs always have one row per test degree of freedom and one column per trial degree of
/// freedom.
pub trait BlockMixedBilinearFormIntegrator<Trial: ?Sized, Test: ?Sized> {
    fn assemble_same_level(
        &self,
        trial_space: &Trial,
        test_space: &Test,
        element_index: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()>;

    /// Fine test element against coarse trial element.
    fn assemble_cross_level(
        &self,
        fine_test_space: &Test,
        fine_element: usize,
        coarse_trial_space: &Trial,
        coarse_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()>;

    /// Coarse test element against fine trial element.
    fn assemble_cross_level_reversed(
        &self,
        coarse_test_space: &Test,
        coarse_element: usize,
        fine_trial_space: &Trial,
        fine_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()>;
}

/// Default quadrature for spatial integrators.
///
/// Strength 4 integrates products of linear basis functions exactly even with a quadratic
/// coefficient.
pub fn default_quadrature() -> QuadraturePair2d {
    triangle(4).expect("Strength 4 triangle quadrature is always available")
}

/// The constant identity coefficient.
pub fn identity_coefficient(_x: &Point2<f64>) -> Matrix2<f64> {
    Matrix2::identity()
}

/// A quadrature point of a fine element, together with its reference coordinates in a coarse
/// element containing the fine element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NestedQuadraturePoint {
    /// Quadrature weight multiplied by the Jacobian determinant of the fine element.
    pub weight: f64,
    pub point: Point2<f64>,
    pub fine_coords: Point2<f64>,
    pub coarse_coords: Point2<f64>,
}

/// Maps the quadrature points of a fine element into a coarse element.
///
/// Passing the same element for both produces the ordinary quadrature points of the element.
pub fn nested_quadrature_points(
    quadrature: &QuadraturePair2d,
    fine_mesh: &TriangleMesh2d,
    fine_element: usize,
    coarse_mesh: &TriangleMesh2d,
    coarse_element: usize,
) -> eyre::Result<Vec<NestedQuadraturePoint>> {
    let fine = fine_mesh.element(fine_element);
    let coarse = coarse_mesh.element(coarse_element);
    let det = fine.reference_jacobian(&Point2::origin()).determinant().abs();
    quadrature
        .weights()
        .iter()
        .zip(quadrature.points())
        .map(|(&w, xi)| {
            let point = fine.map_reference_coords(xi);
            let (coarse_coords, _) = coarse
                .map_physical_coords(&point)
                .ok_or_else(|| eyre!("coarse element {} is degenerate", coarse_element))?;
            Ok(NestedQuadraturePoint {
                weight: w * det,
                point,
                fine_coords: *xi,
                coarse_coords,
            })
        })
        .collect()
}

/// A quadrature point with reference coordinates in the test and the trial element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PairedQuadraturePoint {
    pub weight: f64,
    pub point: Point2<f64>,
    pub test_coords: Point2<f64>,
    pub trial_coords: Point2<f64>,
}

impl NestedQuadraturePoint {
    /// Pairs a fine test element with a coarse trial element.
    pub fn with_fine_test(&self) -> PairedQuadraturePoint {
        PairedQuadraturePoint {
            weight: self.weight,
            point: self.point,
            test_coords: self.fine_coords,
            trial_coords: self.coarse_coords,
        }
    }

    /// Pairs a coarse test element with a fine trial element.
    pub fn with_coarse_test(&self) -> PairedQuadraturePoint {
        PairedQuadraturePoint {
            weight: self.weight,
            point: self.point,
            test_coords: self.coarse_coords,
            trial_coords: self.fine_coords,
        }
    }
}

/// Quadrature points of a single element, with identical test and trial coordinates.
pub fn same_level_quadrature_points(
    quadrature: &QuadraturePair2d,
    mesh: &TriangleMesh2d,
    element_index: usize,
) -> Vec<PairedQuadraturePoint> {
    let element = mesh.element(element_index);
    let det = element.reference_jacobian(&Point2::origin()).determinant().abs();
    quadrature
        .weights()
        .iter()
        .zip(quadrature.points())
        .map(|(&w, xi)| PairedQuadraturePoint {
            weight: w * det,
            point: element.map_reference_coords(xi),
            test_coords: *xi,
            trial_coords: *xi,
        })
        .collect()
}

/// Points for the fine-test/coarse-trial pairing of two nested elements.
pub fn fine_test_quadrature_points(
    quadrature: &QuadraturePair2d,
    fine_mesh: &TriangleMesh2d,
    fine_element: usize,
    coarse_mesh: &TriangleMesh2d,
    coarse_element: usize,
) -> eyre::Result<Vec<PairedQuadraturePoint>> {
    Ok(nested_quadrature_points(quadrature, fine_mesh, fine_element, coarse_mesh, coarse_element)?
        .iter()
        .map(NestedQuadraturePoint::with_fine_test)
        .collect())
}

/// Points for the coarse-test/fine-trial pairing of two nested elements.
pub fn coarse_test_quadrature_points(
    quadrature: &QuadraturePair2d,
    fine_mesh: &TriangleMesh2d,
    fine_element: usize,
    coarse_mesh: &TriangleMesh2d,
    coarse_element: usize,
) -> eyre::Result<Vec<PairedQuadraturePoint>> {
    Ok(nested_quadrature_points(quadrature, fine_mesh, fine_element, coarse_mesh, coarse_element)?
        .iter()
        .map(NestedQuadraturePoint::with_coarse_test)
        .collect())
}
