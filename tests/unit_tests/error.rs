use nalgebra::{DVector, Matrix2, Point2, Vector2};
use sparse_heat::assembly::local::default_quadrature;
use sparse_heat::block::offsets_from_sizes;
use sparse_heat::error::{
    estimate_L2_error, estimate_L2_error_squared, estimate_space_time_errors, estimate_vector_L2_error_squared,
};
use sparse_heat::hierarchy::{NestedFeHierarchy, NestedMeshHierarchy};
use sparse_heat::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use sparse_heat::problem::{HeatProblem, UnitSquareTest2};
use sparse_heat::space::{FiniteElementSpace, LagrangeSpace, RaviartThomasSpace, VectorLagrangeSpace};
use sparse_heat::temporal::TemporalLevels;

#[test]
fn interpolated_linear_function_has_no_error() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(3);
    let space = LagrangeSpace::new(&mesh);
    let u = |x: &Point2<f64>| 2.0 - x.x + 3.0 * x.y;
    let u_h = DVector::from_iterator(mesh.num_vertices(), mesh.vertices().iter().map(u));
    let error = estimate_L2_error(&space, u, u_h.as_view(), &default_quadrature());
    assert!(error < 1e-13);
}

#[test]
fn error_of_zero_approximation_is_norm() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(2);
    let space = LagrangeSpace::new(&mesh);
    let u_h = DVector::zeros(mesh.num_vertices());
    let quadrature = default_quadrature();
    // ∫ (xy)^2 over the unit square is 1/9
    let squared = estimate_L2_error_squared(&space, |x: &Point2<f64>| x.x * x.y, u_h.as_view(), &quadrature);
    assert!((squared - 1.0 / 9.0).abs() < 1e-13);
    let error = estimate_L2_error(&space, |_: &Point2<f64>| 3.0, u_h.as_view(), &quadrature);
    assert!((error - 3.0).abs() < 1e-13);
}

#[test]
fn vector_errors_for_flux_spaces() {
    let mesh = create_unit_square_uniform_tri_mesh_2d(2);
    let quadrature = default_quadrature();

    // Constant fields are reproduced exactly by the normal components on the edges
    let raviart_thomas = RaviartThomasSpace::new(&mesh);
    let field = Vector2::new(1.5, -0.5);
    let coefficients = DVector::from_iterator(
        mesh.num_edges(),
        mesh.edges().iter().map(|edge| {
            let d = mesh.vertices()[edge.0[1]] - mesh.vertices()[edge.0[0]];
            field.dot(&Vector2::new(d.y, -d.x).normalize())
        }),
    );
    let squared = estimate_vector_L2_error_squared(&raviart_thomas, |_: &Point2<f64>| field, coefficients.as_view(), &quadrature);
    assert!(squared < 1e-24);

    let vector_lagrange = VectorLagrangeSpace::new(&mesh);
    let n = mesh.num_vertices();
    let mut coefficients = DVector::zeros(2 * n);
    coefficients.rows_mut(0, n).fill(1.0);
    let squared = estimate_vector_L2_error_squared(
        &vector_lagrange,
        |x: &Point2<f64>| Vector2::new(1.0, x.x),
        coefficients.as_view(),
        &quadrature,
    );
    assert!((squared - 1.0 / 3.0).abs() < 1e-13);
}

fn affine(x: &Point2<f64>) -> f64 {
    1.0 + x.x + 2.0 * x.y
}

/// The product of a single temporal basis function with an affine function in space, solving the
/// heat equation with unit medium for the matching source.
#[derive(Debug)]
struct SeparableProblem {
    levels: TemporalLevels,
    block: usize,
    index: usize,
}

impl HeatProblem for SeparableProblem {
    fn name(&self) -> &'static str {
        "separable"
    }

    fn medium(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::identity()
    }

    fn temperature(&self, x: &Point2<f64>, t: f64) -> f64 {
        self.levels.evaluate(self.block, self.index, t).0 * affine(x)
    }

    fn temperature_gradient(&self, _x: &Point2<f64>, t: f64) -> Vector2<f64> {
        self.levels.evaluate(self.block, self.index, t).0 * Vector2::new(1.0, 2.0)
    }

    fn source(&self, x: &Point2<f64>, t: f64) -> f64 {
        self.levels.evaluate(self.block, self.index, t).1 * affine(x)
    }
}

/// Zero temperature and heat flux vectors laid out in space-time blocks.
fn zero_space_time_vectors(
    levels: &TemporalLevels,
    temperature_hierarchy: &NestedFeHierarchy<LagrangeSpace>,
    flux_hierarchy: &NestedFeHierarchy<VectorLagrangeSpace>,
) -> (DVector<f64>, DVector<f64>) {
    let n = levels.num_levels();
    let temperature_len = (0..n)
        .map(|i| levels.block_size(i) * temperature_hierarchy.space(n - 1 - i).num_dofs())
        .sum();
    let flux_len = (0..n)
        .map(|i| levels.block_size(i) * flux_hierarchy.space(n - 1 - i).num_dofs())
        .sum();
    (DVector::zeros(temperature_len), DVector::zeros(flux_len))
}

#[test]
fn space_time_errors_vanish_for_field_on_coarse_spatial_level() {
    let levels = TemporalLevels::new(1.0, 1, 3);
    let meshes = NestedMeshHierarchy::from_uniform_refinement(create_unit_square_uniform_tri_mesh_2d(1), 3).unwrap();
    let temperature_hierarchy = NestedFeHierarchy::lagrange(&meshes);
    let flux_hierarchy = NestedFeHierarchy::vector_lagrange(&meshes);
    let (mut temperature, mut heat_flux) = zero_space_time_vectors(&levels, &temperature_hierarchy, &flux_hierarchy);

    // The finest temporal block pairs with the coarsest spatial level
    let (block, index) = (2, 1);
    let coarse_mesh = meshes.mesh(0);
    let nv = coarse_mesh.num_vertices();
    let temperature_sizes: Vec<_> = (0..3)
        .map(|i| levels.block_size(i) * temperature_hierarchy.space(2 - i).num_dofs())
        .collect();
    let flux_sizes: Vec<_> = (0..3)
        .map(|i| levels.block_size(i) * flux_hierarchy.space(2 - i).num_dofs())
        .collect();
    let temperature_start = offsets_from_sizes(&temperature_sizes)[block] + index * nv;
    let flux_start = offsets_from_sizes(&flux_sizes)[block] + index * 2 * nv;
    for (v, x) in coarse_mesh.vertices().iter().enumerate() {
        temperature[temperature_start + v] = affine(x);
        heat_flux[flux_start + v] = 1.0;
        heat_flux[flux_start + nv + v] = 2.0;
    }

    let problem = SeparableProblem { levels, block, index };
    let errors = estimate_space_time_errors(
        &levels,
        &temperature_hierarchy,
        &flux_hierarchy,
        &problem,
        temperature.as_view(),
        heat_flux.as_view(),
        &default_quadrature(),
    )
    .unwrap();
    assert!(errors.temperature_L2H1 < 1e-12);
    assert!(errors.heat_flux_L2L2 < 1e-12);
    assert!(errors.divergence_L2L2 < 1e-12);
    assert!(errors.pde_residual < 1e-12);
    assert!(errors.flux_residual < 1e-12);
    assert_eq!(errors.initial_temperature_error, 0.0);
    assert!(errors.least_squares < 1e-12);
}

#[test]
fn zero_space_time_solution_has_unit_relative_errors() {
    let levels = TemporalLevels::new(1.0, 1, 2);
    let meshes = NestedMeshHierarchy::from_uniform_refinement(create_unit_square_uniform_tri_mesh_2d(2), 2).unwrap();
    let temperature_hierarchy = NestedFeHierarchy::lagrange(&meshes);
    let flux_hierarchy = NestedFeHierarchy::vector_lagrange(&meshes);
    let (temperature, heat_flux) = zero_space_time_vectors(&levels, &temperature_hierarchy, &flux_hierarchy);

    let errors = estimate_space_time_errors(
        &levels,
        &temperature_hierarchy,
        &flux_hierarchy,
        &UnitSquareTest2,
        temperature.as_view(),
        heat_flux.as_view(),
        &default_quadrature(),
    )
    .unwrap();
    assert!((errors.temperature_L2H1 - 1.0).abs() < 1e-12);
    assert!((errors.heat_flux_L2L2 - 1.0).abs() < 1e-12);
    assert!((errors.divergence_L2L2 - 1.0).abs() < 1e-12);
    assert!((errors.least_squares - 1.0).abs() < 1e-12);
    assert_eq!(errors.flux_residual, 0.0);
    assert!(errors.pde_residual > 0.0);
    // The initial temperature sin(πx) sin(πy) has L2 norm 1/2
    assert!((errors.initial_temperature_error - 0.5).abs() < 1e-2);
}
