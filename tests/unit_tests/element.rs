use matrixcompare::assert_matrix_eq;
use nalgebra::{point, Matrix2x3, Vector2};
use proptest::prelude::*;
use sparse_heat::element::{
    reference_barycentric_coords, reference_coords_from_barycentric, Segment1dElement, Tri3d2Element,
};

#[test]
fn reference_triangle_basis_is_nodal() {
    let element = Tri3d2Element::reference();
    for (i, vertex) in element.vertices().iter().enumerate() {
        let values = element.evaluate_basis(vertex);
        for j in 0..3 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((values[j] - expected).abs() < 1e-14);
        }
    }
    assert_eq!(element.area(), 2.0);
    assert!((element.map_reference_coords(&point![0.3, -0.2]) - point![0.3, -0.2]).norm() < 1e-14);
}

#[test]
fn physical_gradients_of_unit_triangle() {
    let element = Tri3d2Element::from_vertices([point![0.0, 0.0], point![1.0, 0.0], point![0.0, 1.0]]);
    let gradients = element.physical_gradients(&point![0.0, 0.0]).unwrap();
    let expected = Matrix2x3::from_columns(&[Vector2::new(-1.0, -1.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)]);
    assert_matrix_eq!(gradients, expected, comp = abs, tol = 1e-14);
    assert_eq!(element.area(), 0.5);
    assert!((element.diameter() - 2.0f64.sqrt()).abs() < 1e-14);
    assert_eq!(element.centroid(), point![1.0 / 3.0, 1.0 / 3.0]);
}

#[test]
fn degenerate_triangle_has_no_inverse_map() {
    let element = Tri3d2Element::from_vertices([point![0.0, 0.0], point![1.0, 1.0], point![2.0, 2.0]]);
    assert!(element.physical_gradients(&point![0.0, 0.0]).is_none());
    assert!(element.map_physical_coords(&point![1.0, 1.0]).is_none());
    assert!(!element.contains_point(&point![1.0, 1.0]));
}

#[test]
fn containment_includes_the_boundary() {
    let element = Tri3d2Element::from_vertices([point![0.0, 0.0], point![1.0, 0.0], point![0.0, 1.0]]);
    assert!(element.contains_point(&point![0.5, 0.5]));
    assert!(element.contains_point(&point![0.0, 0.0]));
    assert!(element.contains_point(&point![0.25, 0.0]));
    assert!(!element.contains_point(&point![0.5, 0.500001]));
    assert!(!element.contains_point(&point![-0.1, 0.1]));
}

#[test]
fn segment_basis_and_derivatives() {
    let segment = Segment1dElement::from_endpoints(0.5, 1.5);
    assert_eq!(segment.length(), 1.0);
    assert_eq!(segment.reference_jacobian(), 0.5);
    assert_eq!(segment.map_reference_coords(-1.0), 0.5);
    assert_eq!(segment.map_reference_coords(0.0), 1.0);
    assert_eq!(segment.evaluate_basis(-1.0), Vector2::new(1.0, 0.0));
    assert_eq!(segment.evaluate_basis(0.0), Vector2::new(0.5, 0.5));
    assert_eq!(segment.physical_derivatives(), Vector2::new(-1.0, 1.0));
}

proptest! {
    #[test]
    fn physical_coords_invert_reference_map(element in any::<Tri3d2Element>(), l1 in 0.0..1.0, l2 in 0.0..1.0) {
        // Map a point inside the triangle back and forth
        let (l1, l2) = if l1 + l2 > 1.0 { (1.0 - l1, 1.0 - l2) } else { (l1, l2) };
        let xi = reference_coords_from_barycentric(&[1.0 - l1 - l2, l1, l2]);
        let x = element.map_reference_coords(&xi);
        let (xi_mapped, inside) = element.map_physical_coords(&x).unwrap();
        prop_assert!(inside);
        prop_assert!((xi_mapped - xi).norm() < 1e-9);
        prop_assert!(element.contains_point(&x));
    }

    #[test]
    fn barycentric_coords_reproduce_the_point(element in any::<Tri3d2Element>(), p in sparse_heat::proptest::point2()) {
        let lambda = element.barycentric_coords(&p).unwrap();
        prop_assert!((lambda.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let reconstructed = element
            .vertices()
            .iter()
            .zip(&lambda)
            .fold(Vector2::zeros(), |acc, (v, l)| acc + v.coords * *l);
        prop_assert!((reconstructed - p.coords).norm() < 1e-7);
        let xi = reference_coords_from_barycentric(&lambda);
        prop_assert!((reference_barycentric_coords(&xi)[0] - lambda[0]).abs() < 1e-12);
    }

    #[test]
    fn physical_gradients_sum_to_zero(element in any::<Tri3d2Element>()) {
        let gradients = element.physical_gradients(&point![0.0, 0.0]).unwrap();
        let sum = gradients.column(0) + gradients.column(1) + gradients.column(2);
        prop_assert!(sum.norm() < 1e-9 * gradients.norm().max(1.0));
    }
}
