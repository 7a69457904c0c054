//! End-to-end solution of a configured heat problem.
use crate::assembly::local::default_quadrature;
use crate::config::{ConfigError, SparseHeatConfig};
use crate::discretisation::SparseHeatDiscretisation;
use crate::error::{estimate_L2_error, estimate_space_time_errors, estimate_vector_L2_error_squared, SpaceTimeErrors};
use crate::hierarchy::NestedMeshHierarchy;
use crate::mesh::refinement::refine_uniformly_repeatedly;
use crate::problem::{problem_from_name, HeatProblem};
use crate::temporal::TemporalLevels;
use eyre::eyre;
use log::info;
use nalgebra::{DVector, Point2};
use sparse_heat_linalg::cg::{ConjugateGradient, JacobiPreconditioner, RelativeResidualCriterion};

/// Summary of a completed solve.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    pub num_dofs: usize,
    pub num_iterations: usize,
    /// $L^2$ error of the temperature at the end time on the finest spatial mesh.
    pub temperature_error_at_end_time: f64,
    /// $L^2$ error of the heat flux at the end time on the finest spatial mesh.
    pub heat_flux_error_at_end_time: f64,
    /// Errors over the whole space-time cylinder.
    pub space_time_errors: SpaceTimeErrors,
    pub solution: DVector<f64>,
}

#[derive(Debug, Clone)]
pub struct SparseHeatSolver {
    config: SparseHeatConfig,
}

impl SparseHeatSolver {
    pub fn new(config: SparseHeatConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SparseHeatConfig {
        &self.config
    }

    pub fn temporal_levels(&self) -> TemporalLevels {
        TemporalLevels::new(
            self.config.end_time,
            self.config.min_temporal_level,
            self.config.max_temporal_level(),
        )
    }

    /// Builds the spatial hierarchy, whose coarsest level is the coarse mesh of the problem
    /// refined `min_spatial_level` times.
    pub fn build_mesh_hierarchy(&self, problem: &dyn HeatProblem) -> eyre::Result<NestedMeshHierarchy> {
        let coarsest = refine_uniformly_repeatedly(problem.coarse_mesh(), self.config.min_spatial_level as usize)
            .pop()
            .ok_or_else(|| eyre!("refinement produced no meshes"))?;
        NestedMeshHierarchy::from_uniform_refinement(coarsest, self.config.num_levels as usize)
    }

    pub fn solve(&self) -> eyre::Result<SolveSummary> {
        let problem = problem_from_name(&self.config.problem_type)?;
        self.solve_problem(problem.as_ref())
    }

    /// Solves the given problem with the discretisation parameters of the configuration.
    pub fn solve_problem(&self, problem: &dyn HeatProblem) -> eyre::Result<SolveSummary> {
        let kind = self.config.discretisation_kind()?;
        let mesh_hierarchy = self.build_mesh_hierarchy(problem)?;
        let temporal_levels = self.temporal_levels();
        info!(
            "Solving {} with {} discretisation: {} levels, temporal levels {}..={}, {} finest spatial elements",
            problem.name(),
            kind,
            temporal_levels.num_levels(),
            temporal_levels.min_level(),
            temporal_levels.max_level(),
            mesh_hierarchy.finest_mesh().num_elements()
        );

        let mut discretisation = SparseHeatDiscretisation::new(kind, temporal_levels, &mesh_hierarchy, problem);
        discretisation.assemble_system_sub_matrices()?;
        let blocks = discretisation.build_system_blocks()?;
        let matrix = discretisation.build_system_matrix(&blocks);
        let rhs = discretisation.assemble_rhs()?.to_monolithic();
        info!("System has {} unknowns and {} non-zeros", matrix.nrows(), matrix.nnz());

        let preconditioner = JacobiPreconditioner::from_csr(&matrix);
        let mut solution = DVector::zeros(rhs.len());
        let output = ConjugateGradient::new()
            .with_operator(&matrix)
            .with_preconditioner(&preconditioner)
            .with_stopping_criterion(RelativeResidualCriterion::new(self.config.cg_tolerance))
            .with_max_iter(self.config.cg_max_iterations)
            .solve_with_guess(&rhs, &mut solution)?;
        info!("CG converged in {} iterations", output.num_iterations);

        let handler = discretisation.solution_handler();
        let end_time = temporal_levels.end_time();
        let quadrature = default_quadrature();
        let temperature_space = discretisation.temperature_hierarchy().finest_space();
        let temperature_error = estimate_L2_error(
            temperature_space,
            |x: &Point2<f64>| problem.temperature(x, end_time),
            handler.temperature_at_end_time(&solution),
            &quadrature,
        );
        let flux_space = discretisation.flux_hierarchy().finest_space();
        let flux_error = estimate_vector_L2_error_squared(
            flux_space,
            |x: &Point2<f64>| problem.heat_flux(x, end_time),
            handler.heat_flux_at_end_time(&solution),
            &quadrature,
        )
        .sqrt();
        info!(
            "L2 errors at end time: temperature {:.6e}, heat flux {:.6e}",
            temperature_error, flux_error
        );
        let space_time_errors = estimate_space_time_errors(
            &temporal_levels,
            discretisation.temperature_hierarchy(),
            discretisation.flux_hierarchy(),
            problem,
            handler.temperature(&solution),
            handler.heat_flux(&solution),
            &quadrature,
        )?;
        info!(
            "Relative errors: temperature L2(H1) {:.6e}, heat flux L2(L2) {:.6e}, divergence L2(L2) {:.6e}",
            space_time_errors.temperature_L2H1, space_time_errors.heat_flux_L2L2, space_time_errors.divergence_L2L2
        );
        info!(
            "Least-squares residuals: pde {:.6e}, flux {:.6e}, initial temperature {:.6e}, relative functional {:.6e}",
            space_time_errors.pde_residual,
            space_time_errors.flux_residual,
            space_time_errors.initial_temperature_error,
            space_time_errors.least_squares
        );

        Ok(SolveSummary {
            num_dofs: discretisation.num_dofs(),
            num_iterations: output.num_iterations,
            temperature_error_at_end_time: temperature_error,
            heat_flux_error_at_end_time: flux_error,
            space_time_errors,
            solution,
        })
    }
}
