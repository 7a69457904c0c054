use crate::element::Tri3d2Element;
use crate::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use crate::mesh::TriangleMesh2d;
use crate::temporal::TemporalLevels;
use ::proptest::prelude::*;
use nalgebra::Point2;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates in a moderate range so that geometric predicates stay well-conditioned
    let range = -10.0..10.0;
    [range.clone(), range].prop_map(|[x, y]| Point2::new(x, y))
}

/// Points in the closed unit square.
pub fn unit_square_point() -> impl Strategy<Value = Point2<f64>> {
    [0.0..=1.0, 0.0..=1.0].prop_map(|[x, y]| Point2::new(x, y))
}

impl Arbitrary for Tri3d2Element {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        [point2(), point2(), point2()]
            .prop_filter_map("Triangle is degenerate", |[a, b, c]| {
                let signed_area = 0.5 * (b - a).perp(&(c - a));
                // Reject slivers, whose inverse mappings are too ill-conditioned for tolerances
                // used in tests
                let max_edge = (b - a).norm().max((c - b).norm()).max((a - c).norm());
                if signed_area.abs() < 1e-2 * max_edge * max_edge {
                    None
                } else if signed_area > 0.0 {
                    Some(Tri3d2Element::from_vertices([a, b, c]))
                } else {
                    Some(Tri3d2Element::from_vertices([a, c, b]))
                }
            })
            .boxed()
    }
}

/// Temporal hierarchies with up to four levels.
pub fn temporal_levels() -> impl Strategy<Value = TemporalLevels> {
    (0.25..4.0, 0..4u32, 0..4u32)
        .prop_map(|(end_time, min_level, extra_levels)| TemporalLevels::new(end_time, min_level, min_level + extra_levels))
}

/// Uniform triangulations of the unit square with 1 to 4 cells per dimension.
pub fn unit_square_mesh() -> impl Strategy<Value = TriangleMesh2d> {
    (1..=4usize).prop_map(create_unit_square_uniform_tri_mesh_2d)
}
