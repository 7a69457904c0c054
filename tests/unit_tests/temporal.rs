use crate::dense;
use matrixcompare::assert_matrix_eq;
use nalgebra::DMatrix;
use nalgebra_sparse::CsrMatrix;
use paste::paste;
use proptest::prelude::*;
use sparse_heat::quadrature::univariate::gauss;
use sparse_heat::temporal::{
    assemble_gradient_matrix, assemble_initial_matrix, assemble_mass_matrix, assemble_stiffness_matrix,
    TemporalLevels,
};

fn reference_levels() -> TemporalLevels {
    TemporalLevels::new(1.0, 1, 4)
}

/// Checks that the block has exactly the given non-zero entries.
fn assert_block_entries(block: &CsrMatrix<f64>, expected: &[(usize, usize, f64)]) {
    let mut expected_matrix = DMatrix::zeros(block.nrows(), block.ncols());
    for &(i, j, v) in expected {
        expected_matrix[(i, j)] = v;
    }
    assert_matrix_eq!(dense(block), expected_matrix, comp = abs, tol = 1e-14);
}

/// Integrates `f(basis_i, basis_j)` for all pairs of basis functions, where each basis function is
/// given as a pair of value and derivative, with Gauss quadrature on the finest intervals.
fn integrate_basis_pairs(levels: &TemporalLevels, f: impl Fn((f64, f64), (f64, f64)) -> f64) -> DMatrix<f64> {
    let n = levels.num_dofs();
    let offsets = levels.block_offsets();
    let finest = levels.num_levels() - 1;
    let (weights, points) = gauss(2).unwrap();
    let mut result = DMatrix::zeros(n, n);
    for p in 0..levels.num_intervals(finest) {
        let [a, b] = levels.interval(finest, p);
        for (w, xi) in weights.iter().zip(&points) {
            let t = a + 0.5 * (xi.x + 1.0) * (b - a);
            let weight = 0.5 * (b - a) * w;
            let mut values = vec![(0.0, 0.0); n];
            for block in 0..levels.num_levels() {
                for idx in 0..levels.block_size(block) {
                    values[offsets[block] + idx] = levels.evaluate(block, idx, t);
                }
            }
            for i in 0..n {
                for j in 0..n {
                    result[(i, j)] += weight * f(values[i], values[j]);
                }
            }
        }
    }
    result
}

#[test]
fn block_sizes_and_offsets() {
    let levels = reference_levels();
    assert_eq!(levels.num_levels(), 4);
    assert_eq!(levels.block_sizes(), vec![3, 2, 4, 8]);
    assert_eq!(levels.block_offsets(), vec![0, 3, 5, 9, 17]);
    assert_eq!(levels.num_dofs(), 17);
    assert_eq!(levels.mesh_width(0), 0.5);
    assert_eq!(levels.mesh_width(3), 1.0 / 16.0);
}

#[test]
fn single_level_has_only_nodal_block() {
    let levels = TemporalLevels::new(2.0, 2, 2);
    assert_eq!(levels.block_sizes(), vec![5]);
    let mass = assemble_mass_matrix(&levels);
    assert_eq!(mass.num_block_rows(), 1);
    let h = 0.5;
    #[rustfmt::skip]
    let expected = DMatrix::from_row_slice(
        5,
        5,
        &[
            h / 3.0, h / 6.0, 0.0, 0.0, 0.0,
            h / 6.0, 2.0 * h / 3.0, h / 6.0, 0.0, 0.0,
            0.0, h / 6.0, 2.0 * h / 3.0, h / 6.0, 0.0,
            0.0, 0.0, h / 6.0, 2.0 * h / 3.0, h / 6.0,
            0.0, 0.0, 0.0, h / 6.0, h / 3.0,
        ],
    );
    assert_matrix_eq!(dense(mass.block(0, 0)), expected, comp = abs, tol = 1e-14);
}

#[test]
fn hierarchical_functions_evaluate_as_hats() {
    let levels = reference_levels();
    let h2 = levels.mesh_width(2);
    // Function 1 of block 2 is centered at 3 h_2
    assert_eq!(levels.support(2, 1), [2.0 * h2, 4.0 * h2]);
    let (value, derivative) = levels.evaluate(2, 1, 3.0 * h2);
    assert!((value - 1.0).abs() < 1e-14);
    assert!((derivative + 1.0 / h2).abs() < 1e-12);
    let (value, derivative) = levels.evaluate(2, 1, 2.5 * h2);
    assert!((value - 0.5).abs() < 1e-14);
    assert!((derivative - 1.0 / h2).abs() < 1e-12);
    assert_eq!(levels.evaluate(2, 1, 5.0 * h2), (0.0, 0.0));

    // Nodal functions at the ends of the interval are cut off
    assert_eq!(levels.support(0, 0), [0.0, 0.5]);
    assert_eq!(levels.support(0, 2), [0.5, 1.0]);
    assert_eq!(levels.interval_functions(0, 1), vec![1, 2]);
    assert_eq!(levels.interval_functions(3, 5), vec![2]);
}

#[test]
fn mass_cross_level_blocks_reference_values() {
    let levels = reference_levels();
    let mass = assemble_mass_matrix(&levels);
    let h = |i| levels.mesh_width(i);

    let c = h(1) * h(1) / h(0);
    assert_block_entries(mass.block(1, 0), &[(0, 0, c), (0, 1, c), (1, 1, c), (1, 2, c)]);

    let c = h(2) * h(2) / h(1);
    assert_block_entries(mass.block(2, 1), &[(0, 0, c), (1, 0, c), (2, 1, c), (3, 1, c)]);

    let c = h(2) * h(2) / h(0);
    assert_block_entries(
        mass.block(2, 0),
        &[
            (0, 0, 3.0 * c),
            (0, 1, c),
            (1, 0, c),
            (1, 1, 3.0 * c),
            (2, 1, 3.0 * c),
            (2, 2, c),
            (3, 1, c),
            (3, 2, 3.0 * c),
        ],
    );

    let c = h(3) * h(3) / h(1);
    assert_block_entries(
        mass.block(3, 1),
        &[
            (0, 0, c),
            (1, 0, 3.0 * c),
            (2, 0, 3.0 * c),
            (3, 0, c),
            (4, 1, c),
            (5, 1, 3.0 * c),
            (6, 1, 3.0 * c),
            (7, 1, c),
        ],
    );

    let c = h(3) * h(3) / h(0);
    assert_block_entries(
        mass.block(3, 0),
        &[
            (0, 0, 7.0 * c),
            (0, 1, c),
            (1, 0, 5.0 * c),
            (1, 1, 3.0 * c),
            (2, 0, 3.0 * c),
            (2, 1, 5.0 * c),
            (3, 0, c),
            (3, 1, 7.0 * c),
            (4, 1, 7.0 * c),
            (4, 2, c),
            (5, 1, 5.0 * c),
            (5, 2, 3.0 * c),
            (6, 1, 3.0 * c),
            (6, 2, 5.0 * c),
            (7, 1, c),
            (7, 2, 7.0 * c),
        ],
    );

    // Upper blocks are transposes of the lower blocks
    for m in 1..levels.num_levels() {
        for n in 0..m {
            assert_matrix_eq!(dense(mass.block(n, m)), dense(mass.block(m, n)).transpose());
        }
    }
}

#[test]
fn stiffness_cross_level_blocks_vanish() {
    let levels = reference_levels();
    let stiffness = assemble_stiffness_matrix(&levels);
    for i in 0..levels.num_levels() {
        for j in 0..levels.num_levels() {
            if i != j {
                assert_eq!(stiffness.block(i, j).nnz(), 0);
            }
        }
    }
    let h3 = levels.mesh_width(3);
    assert_matrix_eq!(
        dense(stiffness.block(3, 3)),
        DMatrix::identity(8, 8) * (2.0 / h3),
        comp = abs,
        tol = 1e-12
    );
}

#[test]
fn initial_matrix_has_single_entry() {
    let levels = reference_levels();
    let initial = assemble_initial_matrix(&levels).to_monolithic();
    assert_eq!(initial.nnz(), 1);
    assert_eq!(dense(&initial)[(0, 0)], 1.0);
}

#[test]
fn gradient_nodal_block_reference_values() {
    let levels = TemporalLevels::new(1.0, 1, 1);
    let gradient = assemble_gradient_matrix(&levels);
    let expected = DMatrix::from_row_slice(3, 3, &[-0.5, 0.5, 0.0, -0.5, 0.0, 0.5, 0.0, -0.5, 0.5]);
    assert_matrix_eq!(dense(gradient.block(0, 0)), expected, comp = abs, tol = 1e-14);
}

macro_rules! gradient_structure_tests {
    ($($name:ident: ($end_time:expr, $min_level:expr, $max_level:expr)),* $(,)?) => {
        paste! {
            $(
                #[test]
                fn [<gradient_upper_blocks_are_negated_transposes_ $name>]() {
                    let levels = TemporalLevels::new($end_time, $min_level, $max_level);
                    let gradient = assemble_gradient_matrix(&levels);
                    for m in 1..levels.num_levels() {
                        for n in 0..m {
                            assert_matrix_eq!(
                                dense(gradient.block(n, m)),
                                -dense(gradient.block(m, n)).transpose(),
                                comp = abs,
                                tol = 1e-14
                            );
                        }
                    }
                }

                #[test]
                fn [<gradient_symmetric_part_is_boundary_trace_ $name>]() {
                    // G + G^T has entries φ_i φ_j evaluated between 0 and T
                    let levels = TemporalLevels::new($end_time, $min_level, $max_level);
                    let g = dense(&assemble_gradient_matrix(&levels).to_monolithic());
                    let n = levels.num_dofs();
                    let mut expected = DMatrix::zeros(n, n);
                    let last = levels.block_size(0) - 1;
                    expected[(0, 0)] = -1.0;
                    expected[(last, last)] = 1.0;
                    assert_matrix_eq!(&g + g.transpose(), expected, comp = abs, tol = 1e-12);
                }
            )*
        }
    };
}

gradient_structure_tests! {
    single_level: (1.0, 2, 2),
    two_levels: (1.0, 1, 2),
    four_levels: (1.0, 1, 4),
    long_interval: (3.5, 0, 3),
}

proptest! {
    #[test]
    fn closed_form_matrices_match_quadrature(levels in sparse_heat::proptest::temporal_levels()) {
        let scale = levels.end_time().max(1.0 / levels.end_time());
        let tol = 1e-10 * scale * 4f64.powi(levels.max_level() as i32);

        let mass = dense(&assemble_mass_matrix(&levels).to_monolithic());
        let expected_mass = integrate_basis_pairs(&levels, |(phi_i, _), (phi_j, _)| phi_i * phi_j);
        assert_matrix_eq!(mass, expected_mass, comp = abs, tol = tol);

        let stiffness = dense(&assemble_stiffness_matrix(&levels).to_monolithic());
        let expected_stiffness = integrate_basis_pairs(&levels, |(_, dphi_i), (_, dphi_j)| dphi_i * dphi_j);
        assert_matrix_eq!(stiffness, expected_stiffness, comp = abs, tol = tol);

        let gradient = dense(&assemble_gradient_matrix(&levels).to_monolithic());
        let expected_gradient = integrate_basis_pairs(&levels, |(phi_i, _), (_, dphi_j)| dphi_j * phi_i);
        assert_matrix_eq!(gradient, expected_gradient, comp = abs, tol = tol);
    }

    #[test]
    fn mass_entry_is_fine_width_times_coarse_value_at_fine_center(levels in sparse_heat::proptest::temporal_levels()) {
        let mass = assemble_mass_matrix(&levels);
        for m in 1..levels.num_levels() {
            let h_m = levels.mesh_width(m);
            for n in 0..m {
                let block = dense(mass.block(m, n));
                for i in 0..levels.block_size(m) {
                    let center = (2 * i + 1) as f64 * h_m;
                    for j in 0..levels.block_size(n) {
                        let (value, _) = levels.evaluate(n, j, center);
                        prop_assert!((block[(i, j)] - h_m * value).abs() < 1e-12 * levels.end_time());
                    }
                }
            }
        }
    }
}
