//! Functionality for error estimation.
use crate::assembly::local::{nested_quadrature_points, same_level_quadrature_points};
use crate::block::offsets_from_sizes;
use crate::hierarchy::NestedFeHierarchy;
use crate::problem::HeatProblem;
use crate::quadrature::univariate::gauss;
use crate::quadrature::QuadraturePair2d;
use crate::space::{ScalarFiniteElementSpace, VectorFiniteElementSpace};
use crate::temporal::TemporalLevels;
use nalgebra::{DVector, DVectorView, Point2, Vector2};

/// Estimate the squared $L^2$ error $\norm{u_h - u}^2_{L^2}$ of a scalar finite element function
/// with the given coefficients.
///
/// # Panics
///
/// Panics if the number of coefficients does not match the number of degrees of freedom.
#[allow(non_snake_case)]
pub fn estimate_L2_error_squared<S>(
    space: &S,
    u: impl Fn(&Point2<f64>) -> f64,
    u_h: DVectorView<f64>,
    quadrature: &QuadraturePair2d,
) -> f64
where
    S: ?Sized + ScalarFiniteElementSpace,
{
    assert_eq!(u_h.len(), space.num_dofs());
    let n = space.element_dof_count();
    let mut dofs = vec![0; n];
    let mut phi = vec![0.0; n];

    let mut result = 0.0;
    for element_index in 0..space.num_elements() {
        space.populate_element_dofs(element_index, &mut dofs);
        for p in same_level_quadrature_points(quadrature, space.mesh(), element_index) {
            space.populate_element_basis(element_index, &mut phi, &p.test_coords);
            let u_h_p: f64 = dofs.iter().zip(&phi).map(|(&dof, phi_i)| u_h[dof] * phi_i).sum();
            let e = u_h_p - u(&p.point);
            result += p.weight * e * e;
        }
    }
    result
}

/// Estimate the squared $L^2$ error of a vector-valued finite element function.
///
/// # Panics
///
/// Panics if the number of coefficients does not match the number of degrees of freedom.
#[allow(non_snake_case)]
pub fn estimate_vector_L2_error_squared<S>(
    space: &S,
    u: impl Fn(&Point2<f64>) -> Vector2<f64>,
    u_h: DVectorView<f64>,
    quadrature: &QuadraturePair2d,
) -> f64
where
    S: ?Sized + VectorFiniteElementSpace,
{
    assert_eq!(u_h.len(), space.num_dofs());
    let n = space.element_dof_count();
    let mut dofs = vec![0; n];
    let mut phi = vec![Vector2::zeros(); n];

    let mut result = 0.0;
    for element_index in 0..space.num_elements() {
        space.populate_element_dofs(element_index, &mut dofs);
        for p in same_level_quadrature_points(quadrature, space.mesh(), element_index) {
            space.populate_element_vector_basis(element_index, &mut phi, &p.test_coords);
            let u_h_p = dofs
                .iter()
                .zip(&phi)
                .fold(Vector2::zeros(), |acc, (&dof, phi_i)| acc + phi_i * u_h[dof]);
            result += p.weight * (u_h_p - u(&p.point)).norm_squared();
        }
    }
    result
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$ of a scalar finite element function.
#[allow(non_snake_case)]
pub fn estimate_L2_error<S>(
    space: &S,
    u: impl Fn(&Point2<f64>) -> f64,
    u_h: DVectorView<f64>,
    quadrature: &QuadraturePair2d,
) -> f64
where
    S: ?Sized + ScalarFiniteElementSpace,
{
    estimate_L2_error_squared(space, u, u_h, quadrature).sqrt()
}

/// Errors of a space-time solution over the whole time interval.
///
/// The natural norm errors are relative to the corresponding norm of the exact solution. A
/// relative error whose reference norm vanishes is reported as the absolute error instead.
#[allow(non_snake_case)]
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct SpaceTimeErrors {
    /// Relative $L^2(0, T; H^1)$ error of the temperature.
    pub temperature_L2H1: f64,
    /// Relative $L^2(0, T; L^2)$ error of the heat flux.
    pub heat_flux_L2L2: f64,
    /// Relative $L^2(0, T; L^2)$ error of $\partial_t u_h - \nabla \cdot q_h$ against the source.
    pub divergence_L2L2: f64,
    /// $L^2(0, T; L^2)$ norm of $\partial_t u_h - \nabla \cdot q_h - f$.
    pub pde_residual: f64,
    /// $L^2(0, T; L^2)$ norm of $q_h - Q \nabla u_h$.
    pub flux_residual: f64,
    /// $L^2$ error of the temperature at the initial time.
    pub initial_temperature_error: f64,
    /// Square root of the least-squares functional of the solution, relative to its value for
    /// the zero function.
    pub least_squares: f64,
}

fn relative(error_squared: f64, norm_squared: f64) -> f64 {
    if norm_squared > 0.0 {
        (error_squared / norm_squared).sqrt()
    } else {
        error_squared.sqrt()
    }
}

/// Element basis data of one spatial level at a quadrature point of the finest mesh.
#[derive(Debug, Clone)]
struct LevelBasis {
    temperature_dofs: Vec<usize>,
    values: Vec<f64>,
    gradients: Vec<Vector2<f64>>,
    flux_dofs: Vec<usize>,
    flux_values: Vec<Vector2<f64>>,
    divergence: Vec<f64>,
}

#[derive(Debug, Clone)]
struct FinestPoint {
    weight: f64,
    point: Point2<f64>,
    /// Indexed by spatial level.
    levels: Vec<LevelBasis>,
}

/// Tabulates the basis functions of every level at the quadrature points of the finest mesh,
/// evaluated through the ancestor of each finest element.
fn tabulate_finest_points<T, Q>(
    temperature_hierarchy: &NestedFeHierarchy<'_, T>,
    flux_hierarchy: &NestedFeHierarchy<'_, Q>,
    quadrature: &QuadraturePair2d,
) -> eyre::Result<Vec<FinestPoint>>
where
    T: ScalarFiniteElementSpace,
    Q: VectorFiniteElementSpace,
{
    let meshes = temperature_hierarchy.mesh_hierarchy();
    let finest = meshes.num_levels() - 1;
    let finest_mesh = meshes.finest_mesh();
    let num_elements = finest_mesh.num_elements();

    let ancestors: Vec<Vec<usize>> = (0..meshes.num_levels())
        .map(|level| {
            if level == finest {
                (0..num_elements).collect()
            } else {
                let mut parents = vec![0; num_elements];
                for (parent, child) in temperature_hierarchy.multi_level_table(level, finest).iter() {
                    parents[child] = parent;
                }
                parents
            }
        })
        .collect();

    let mut points = Vec::new();
    for element in 0..num_elements {
        let first = points.len();
        for (level, parents) in ancestors.iter().enumerate() {
            let temperature_space = temperature_hierarchy.space(level);
            let flux_space = flux_hierarchy.space(level);
            let ancestor = parents[element];
            let nested = nested_quadrature_points(quadrature, finest_mesh, element, meshes.mesh(level), ancestor)?;
            for (q, p) in nested.iter().enumerate() {
                let n = temperature_space.element_dof_count();
                let m = flux_space.element_dof_count();
                let mut basis = LevelBasis {
                    temperature_dofs: vec![0; n],
                    values: vec![0.0; n],
                    gradients: vec![Vector2::zeros(); n],
                    flux_dofs: vec![0; m],
                    flux_values: vec![Vector2::zeros(); m],
                    divergence: vec![0.0; m],
                };
                temperature_space.populate_element_dofs(ancestor, &mut basis.temperature_dofs);
                temperature_space.populate_element_basis(ancestor, &mut basis.values, &p.coarse_coords);
                temperature_space.populate_element_gradients(ancestor, &mut basis.gradients, &p.coarse_coords);
                flux_space.populate_element_dofs(ancestor, &mut basis.flux_dofs);
                flux_space.populate_element_vector_basis(ancestor, &mut basis.flux_values, &p.coarse_coords);
                flux_space.populate_element_divergence(ancestor, &mut basis.divergence, &p.coarse_coords);
                if level == 0 {
                    points.push(FinestPoint {
                        weight: p.weight,
                        point: p.point,
                        levels: Vec::with_capacity(ancestors.len()),
                    });
                }
                points[first + q].levels.push(basis);
            }
        }
    }
    Ok(points)
}

/// Spatial coefficient vectors of one level, combined with the temporal basis at a fixed time.
#[derive(Debug, Clone)]
struct LevelFields {
    temperature: DVector<f64>,
    temperature_rate: DVector<f64>,
    heat_flux: DVector<f64>,
}

/// Estimates the errors of a sparse space-time solution against the exact solution of the
/// problem.
///
/// `temperature` and `heat_flux` are the two parts of the solution vector. Block `i` of each
/// pairs temporal block `i` with spatial level `L - 1 - i`. Time integrals use three Gauss points
/// on every interval of the finest temporal level, on which all temporal basis functions are
/// linear. The contributions of coarser spatial levels are evaluated at the quadrature points of
/// the finest mesh through the ancestors of the finest elements.
///
/// # Panics
///
/// Panics if the hierarchies and the temporal levels have different numbers of levels, or if the
/// coefficient vectors do not match the block layout.
pub fn estimate_space_time_errors<T, Q>(
    temporal_levels: &TemporalLevels,
    temperature_hierarchy: &NestedFeHierarchy<'_, T>,
    flux_hierarchy: &NestedFeHierarchy<'_, Q>,
    problem: &dyn HeatProblem,
    temperature: DVectorView<f64>,
    heat_flux: DVectorView<f64>,
    quadrature: &QuadraturePair2d,
) -> eyre::Result<SpaceTimeErrors>
where
    T: ScalarFiniteElementSpace,
    Q: VectorFiniteElementSpace,
{
    let num_levels = temporal_levels.num_levels();
    assert_eq!(temperature_hierarchy.num_levels(), num_levels);
    assert_eq!(flux_hierarchy.num_levels(), num_levels);

    let spatial_level = |block: usize| num_levels - 1 - block;
    let temperature_sizes: Vec<usize> = (0..num_levels)
        .map(|i| temporal_levels.block_size(i) * temperature_hierarchy.space(spatial_level(i)).num_dofs())
        .collect();
    let flux_sizes: Vec<usize> = (0..num_levels)
        .map(|i| temporal_levels.block_size(i) * flux_hierarchy.space(spatial_level(i)).num_dofs())
        .collect();
    assert_eq!(temperature.len(), temperature_sizes.iter().sum::<usize>());
    assert_eq!(heat_flux.len(), flux_sizes.iter().sum::<usize>());
    let temperature_offsets = offsets_from_sizes(&temperature_sizes);
    let flux_offsets = offsets_from_sizes(&flux_sizes);

    let points = tabulate_finest_points(temperature_hierarchy, flux_hierarchy, quadrature)?;
    let (time_weights, time_points) = gauss(3)?;
    let finest_block = num_levels - 1;
    let width = temporal_levels.mesh_width(finest_block);

    let mut temperature_error = 0.0;
    let mut temperature_norm = 0.0;
    let mut flux_error = 0.0;
    let mut flux_norm = 0.0;
    let mut pde_residual = 0.0;
    let mut source_norm = 0.0;
    let mut flux_residual = 0.0;

    for interval in 0..temporal_levels.num_intervals(finest_block) {
        for (w, xi) in time_weights.iter().zip(&time_points) {
            let t = (interval as f64 + 0.5 * (xi.x + 1.0)) * width;
            let time_weight = 0.5 * width * w;

            // Indexed by spatial level
            let fields: Vec<LevelFields> = (0..num_levels)
                .rev()
                .map(|block| {
                    let nx = temperature_hierarchy.space(spatial_level(block)).num_dofs();
                    let nq = flux_hierarchy.space(spatial_level(block)).num_dofs();
                    let mut level_fields = LevelFields {
                        temperature: DVector::zeros(nx),
                        temperature_rate: DVector::zeros(nx),
                        heat_flux: DVector::zeros(nq),
                    };
                    let block_interval = interval >> (finest_block - block);
                    for j in temporal_levels.interval_functions(block, block_interval) {
                        let (phi, dphi) = temporal_levels.evaluate(block, j, t);
                        let u_j = temperature.rows(temperature_offsets[block] + j * nx, nx);
                        let q_j = heat_flux.rows(flux_offsets[block] + j * nq, nq);
                        level_fields.temperature.axpy(phi, &u_j, 1.0);
                        level_fields.temperature_rate.axpy(dphi, &u_j, 1.0);
                        level_fields.heat_flux.axpy(phi, &q_j, 1.0);
                    }
                    level_fields
                })
                .collect();

            for p in &points {
                let mut u_h = 0.0;
                let mut grad_u_h = Vector2::zeros();
                let mut du_h = 0.0;
                let mut q_h = Vector2::zeros();
                let mut div_q_h = 0.0;
                for (basis, level_fields) in p.levels.iter().zip(&fields) {
                    for (a, &dof) in basis.temperature_dofs.iter().enumerate() {
                        let c = level_fields.temperature[dof];
                        u_h += c * basis.values[a];
                        grad_u_h += basis.gradients[a] * c;
                        du_h += level_fields.temperature_rate[dof] * basis.values[a];
                    }
                    for (a, &dof) in basis.flux_dofs.iter().enumerate() {
                        let c = level_fields.heat_flux[dof];
                        q_h += basis.flux_values[a] * c;
                        div_q_h += c * basis.divergence[a];
                    }
                }

                let x = &p.point;
                let weight = time_weight * p.weight;
                let u = problem.temperature(x, t);
                let grad_u = problem.temperature_gradient(x, t);
                let q = problem.heat_flux(x, t);
                let f = problem.source(x, t);

                temperature_norm += weight * (u * u + grad_u.norm_squared());
                temperature_error += weight * ((u - u_h).powi(2) + (grad_u - grad_u_h).norm_squared());
                flux_norm += weight * q.norm_squared();
                flux_error += weight * (q - q_h).norm_squared();
                source_norm += weight * f * f;
                pde_residual += weight * (du_h - div_q_h - f).powi(2);
                flux_residual += weight * (q_h - problem.medium(x) * grad_u_h).norm_squared();
            }
        }
    }

    // All hierarchical functions vanish at the initial time
    let finest_space = temperature_hierarchy.finest_space();
    let initial = temperature.rows(0, finest_space.num_dofs());
    let initial_data = |x: &Point2<f64>| problem.initial_temperature(x);
    let initial_error = estimate_L2_error_squared(finest_space, initial_data, initial, quadrature);
    let zero = DVector::zeros(finest_space.num_dofs());
    let initial_norm = estimate_L2_error_squared(finest_space, initial_data, zero.as_view(), quadrature);

    Ok(SpaceTimeErrors {
        temperature_L2H1: relative(temperature_error, temperature_norm),
        heat_flux_L2L2: relative(flux_error, flux_norm),
        divergence_L2L2: relative(pde_residual, source_norm),
        pde_residual: pde_residual.sqrt(),
        flux_residual: flux_residual.sqrt(),
        initial_temperature_error: initial_error.sqrt(),
        least_squares: relative(pde_residual + flux_residual + initial_error, source_norm + initial_norm),
    })
}
