//! The sparse space-time space is a subspace of the full tensor product space on the finest
//! temporal and spatial meshes, so the sparse system must be the Galerkin restriction of the
//! full system.
use crate::common::{p1_prolongation, rt_prolongation, vector_p1_prolongation};
use crate::dense;
use matrixcompare::assert_matrix_eq;
use nalgebra::DMatrix;
use paste::paste;
use sparse_heat::discretisation::dense::DenseHeatDiscretisation;
use sparse_heat::discretisation::{DiscretisationKind, SparseHeatDiscretisation};
use sparse_heat::hierarchy::NestedMeshHierarchy;
use sparse_heat::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use sparse_heat::mesh::TriangleMesh2d;
use sparse_heat::problem::problem_from_name;
use sparse_heat::temporal::TemporalLevels;

/// Expresses the sparse space-time basis of one field in the tensor product basis on the finest
/// meshes, with the temporal index as the outer index in both bases.
fn space_time_prolongation(
    levels: &TemporalLevels,
    hierarchy: &NestedMeshHierarchy,
    spatial_prolongation: impl Fn(&TriangleMesh2d, &TriangleMesh2d) -> DMatrix<f64>,
) -> DMatrix<f64> {
    let num_levels = levels.num_levels();
    let finest_width = levels.mesh_width(num_levels - 1);
    let num_time_nodes = (levels.end_time() / finest_width).round() as usize + 1;

    let blocks: Vec<DMatrix<f64>> = (0..num_levels)
        .map(|i| {
            let temporal = DMatrix::from_fn(num_time_nodes, levels.block_size(i), |n, j| {
                levels.evaluate(i, j, n as f64 * finest_width).0
            });
            let spatial = spatial_prolongation(hierarchy.mesh(num_levels - 1 - i), hierarchy.finest_mesh());
            temporal.kronecker(&spatial)
        })
        .collect();

    let nrows = blocks[0].nrows();
    let ncols = blocks.iter().map(|block| block.ncols()).sum();
    let mut prolongation = DMatrix::zeros(nrows, ncols);
    let mut offset = 0;
    for block in &blocks {
        assert_eq!(block.nrows(), nrows);
        prolongation.view_mut((0, offset), block.shape()).copy_from(block);
        offset += block.ncols();
    }
    prolongation
}

fn compare_with_restricted_full_system(
    kind: DiscretisationKind,
    problem_name: &str,
    end_time: f64,
    min_temporal_level: u32,
    num_levels: usize,
) {
    let problem = problem_from_name(problem_name).unwrap();
    let hierarchy =
        NestedMeshHierarchy::from_uniform_refinement(create_unit_square_uniform_tri_mesh_2d(1), num_levels).unwrap();
    let max_temporal_level = min_temporal_level + num_levels as u32 - 1;
    let levels = TemporalLevels::new(end_time, min_temporal_level, max_temporal_level);

    let mut sparse = SparseHeatDiscretisation::new(kind, levels, &hierarchy, problem.as_ref());
    sparse.assemble_system_sub_matrices().unwrap();
    let sparse_blocks = sparse.build_system_blocks().unwrap();

    let full = DenseHeatDiscretisation::new(kind, end_time, max_temporal_level, hierarchy.finest_mesh(), problem.as_ref());
    let full_blocks = full.build_system_blocks().unwrap();

    let p_temperature = space_time_prolongation(&levels, &hierarchy, p1_prolongation);
    let p_flux = match kind {
        DiscretisationKind::H1Hdiv => space_time_prolongation(&levels, &hierarchy, rt_prolongation),
        DiscretisationKind::H1H1 => space_time_prolongation(&levels, &hierarchy, vector_p1_prolongation),
    };
    assert_eq!(p_temperature.shape(), (full.num_temperature_dofs(), sparse_blocks.block11.ncols()));
    assert_eq!(p_flux.shape(), (full.num_flux_dofs(), sparse_blocks.block22.ncols()));

    let restrict = |left: &DMatrix<f64>, full: &DMatrix<f64>, right: &DMatrix<f64>| left.transpose() * full * right;
    assert_matrix_eq!(
        dense(&sparse_blocks.block11.to_monolithic()),
        restrict(&p_temperature, &dense(&full_blocks.block11.to_monolithic()), &p_temperature),
        comp = abs,
        tol = 1e-11
    );
    assert_matrix_eq!(
        dense(&sparse_blocks.block12.to_monolithic()),
        restrict(&p_temperature, &dense(&full_blocks.block12.to_monolithic()), &p_flux),
        comp = abs,
        tol = 1e-11
    );
    assert_matrix_eq!(
        dense(&sparse_blocks.block22.to_monolithic()),
        restrict(&p_flux, &dense(&full_blocks.block22.to_monolithic()), &p_flux),
        comp = abs,
        tol = 1e-11
    );
}

macro_rules! galerkin_restriction_tests {
    ($($name:ident: ($kind:expr, $problem:expr, $end_time:expr, $min_temporal_level:expr, $num_levels:expr)),* $(,)?) => {
        paste! {
            $(
                #[test]
                fn [<sparse_system_is_restriction_of_full_system_ $name>]() {
                    compare_with_restricted_full_system($kind, $problem, $end_time, $min_temporal_level, $num_levels);
                }
            )*
        }
    };
}

galerkin_restriction_tests! {
    h1h1_three_levels: (DiscretisationKind::H1H1, "unitSquare_test4", 1.0, 1, 3),
    h1hdiv_three_levels: (DiscretisationKind::H1Hdiv, "unitSquare_test4", 1.0, 1, 3),
    h1hdiv_scalar_medium: (DiscretisationKind::H1Hdiv, "unitSquare_test1", 0.5, 0, 3),
    h1h1_two_levels: (DiscretisationKind::H1H1, "unitSquare_test2", 2.0, 2, 2),
}
