use nalgebra::{Matrix2, Point2, Vector2};
use sparse_heat::config::{ConfigError, SparseHeatConfig};
use sparse_heat::error::SpaceTimeErrors;
use sparse_heat::problem::{problem_from_name, HeatProblem};
use sparse_heat::solver::SparseHeatSolver;

fn config(problem: &str, discretisation: &str, num_levels: u32, min_temporal: u32, min_spatial: u32) -> SparseHeatConfig {
    SparseHeatConfig {
        problem_type: problem.to_string(),
        discretisation_type: discretisation.to_string(),
        num_levels,
        min_temporal_level: min_temporal,
        min_spatial_level: min_spatial,
        ..SparseHeatConfig::default()
    }
}

fn solve(config: SparseHeatConfig) -> sparse_heat::solver::SolveSummary {
    SparseHeatSolver::new(config).unwrap().solve().unwrap()
}

#[test]
fn invalid_config_is_rejected() {
    let result = SparseHeatSolver::new(SparseHeatConfig {
        deg: 2,
        ..SparseHeatConfig::default()
    });
    assert_eq!(result.unwrap_err(), ConfigError::UnsupportedDegree(2));
}

#[test]
fn mesh_hierarchy_starts_at_refined_coarse_mesh() {
    let solver = SparseHeatSolver::new(config("unitSquare_test2", "H1Hdiv", 3, 1, 2)).unwrap();
    let problem = problem_from_name("unitSquare_test2").unwrap();
    let hierarchy = solver.build_mesh_hierarchy(problem.as_ref()).unwrap();
    assert_eq!(hierarchy.num_levels(), 3);
    assert_eq!(hierarchy.mesh(0).num_elements(), 2 * 16);
    assert_eq!(hierarchy.finest_mesh().num_elements(), 2 * 16 * 16);
    let levels = solver.temporal_levels();
    assert_eq!((levels.min_level(), levels.max_level()), (1, 3));
    assert_eq!(levels.num_levels(), hierarchy.num_levels());
}

#[test]
fn refinement_reduces_end_time_errors() {
    let coarse = solve(config("unitSquare_test2", "H1Hdiv", 1, 1, 1));
    let fine = solve(config("unitSquare_test2", "H1Hdiv", 1, 3, 3));
    assert_eq!(coarse.solution.len(), coarse.num_dofs);
    assert!(coarse.temperature_error_at_end_time.is_finite());
    assert!(fine.temperature_error_at_end_time < coarse.temperature_error_at_end_time);
    assert!(fine.heat_flux_error_at_end_time < coarse.heat_flux_error_at_end_time);
    // The exact temperature at the end time has L2 norm 1/2
    assert!(fine.temperature_error_at_end_time < 0.25);
}

#[test]
fn refinement_reduces_space_time_errors() {
    for discretisation in ["H1Hdiv", "H1H1"] {
        let coarse = solve(config("unitSquare_test2", discretisation, 1, 1, 1)).space_time_errors;
        let fine = solve(config("unitSquare_test2", discretisation, 1, 3, 3)).space_time_errors;
        assert!(fine.temperature_L2H1 < coarse.temperature_L2H1);
        assert!(fine.heat_flux_L2L2 < coarse.heat_flux_L2L2);
        assert!(fine.divergence_L2L2 < coarse.divergence_L2L2);
        // The discrete spaces are nested, so the minimised functional cannot grow
        assert!(fine.least_squares < coarse.least_squares);
        assert!(fine.temperature_L2H1 < 0.5);
    }
}

#[test]
fn sparse_levels_improve_the_coarsest_solution() {
    for discretisation in ["H1Hdiv", "H1H1"] {
        let single = solve(config("unitSquare_test2", discretisation, 1, 1, 1));
        let sparse = solve(config("unitSquare_test2", discretisation, 3, 1, 1));
        assert!(sparse.num_dofs > single.num_dofs);
        assert!(sparse.num_iterations > 0);
        assert!(sparse.temperature_error_at_end_time < single.temperature_error_at_end_time);
        assert!(sparse.heat_flux_error_at_end_time.is_finite());
    }
}

/// A problem whose exact solution vanishes identically.
#[derive(Debug)]
struct ZeroProblem;

impl HeatProblem for ZeroProblem {
    fn name(&self) -> &'static str {
        "zero"
    }

    fn medium(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::identity() * 2.0
    }

    fn temperature(&self, _x: &Point2<f64>, _t: f64) -> f64 {
        0.0
    }

    fn temperature_gradient(&self, _x: &Point2<f64>, _t: f64) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn source(&self, _x: &Point2<f64>, _t: f64) -> f64 {
        0.0
    }
}

#[test]
fn zero_data_gives_zero_solution() {
    let solver = SparseHeatSolver::new(config("unitSquare_test1", "H1Hdiv", 2, 1, 1)).unwrap();
    let summary = solver.solve_problem(&ZeroProblem).unwrap();
    assert_eq!(summary.num_iterations, 0);
    assert!(summary.solution.iter().all(|&v| v == 0.0));
    assert_eq!(summary.temperature_error_at_end_time, 0.0);
    assert_eq!(summary.heat_flux_error_at_end_time, 0.0);
    assert_eq!(summary.space_time_errors, SpaceTimeErrors::default());
}
