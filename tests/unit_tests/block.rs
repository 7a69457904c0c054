use crate::dense;
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use proptest::prelude::*;
use sparse_heat::block::{offsets_from_sizes, BlockMatrix, BlockVector};

fn block_matrix_from_dense(row_sizes: &[usize], col_sizes: &[usize], matrix: &DMatrix<f64>) -> BlockMatrix {
    let row_offsets = offsets_from_sizes(row_sizes);
    let col_offsets = offsets_from_sizes(col_sizes);
    let mut blocks = Vec::new();
    for i in 0..row_sizes.len() {
        for j in 0..col_sizes.len() {
            let block = matrix.view((row_offsets[i], col_offsets[j]), (row_sizes[i], col_sizes[j]));
            blocks.push(CsrMatrix::from(&block.into_owned()));
        }
    }
    BlockMatrix::from_blocks(row_sizes, col_sizes, blocks)
}

#[test]
fn offsets_are_prefix_sums() {
    assert_eq!(offsets_from_sizes(&[]), vec![0]);
    assert_eq!(offsets_from_sizes(&[3, 0, 2]), vec![0, 3, 3, 5]);
}

#[test]
fn zero_block_matrix_dimensions() {
    let matrix = BlockMatrix::zeros(&[2, 3], &[1, 4, 0]);
    assert_eq!(matrix.num_block_rows(), 2);
    assert_eq!(matrix.num_block_cols(), 3);
    assert_eq!((matrix.nrows(), matrix.ncols()), (5, 5));
    assert_eq!(matrix.row_offsets(), &[0, 2, 5]);
    assert_eq!(matrix.col_block_sizes(), vec![1, 4, 0]);
    assert_eq!(matrix.block(1, 1).nrows(), 3);
    assert_eq!(matrix.block(1, 1).ncols(), 4);
    assert_eq!(matrix.to_monolithic().nnz(), 0);
}

#[test]
#[should_panic]
fn set_block_rejects_wrong_shape() {
    let mut matrix = BlockMatrix::zeros(&[2, 3], &[2, 3]);
    matrix.set_block(0, 1, CsrMatrix::identity(2));
}

#[test]
fn block_vector_views() {
    let mut vector = BlockVector::from_vector(&[2, 1, 3], DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    assert_eq!(vector.num_blocks(), 3);
    assert_eq!(vector.len(), 6);
    assert!(!vector.is_empty());
    assert_eq!(vector.block(1)[0], 3.0);
    assert_eq!(vector.block(2).len(), 3);
    vector.block_mut(0).fill(0.0);
    assert_eq!(vector.as_vector().as_slice(), &[0.0, 0.0, 3.0, 4.0, 5.0, 6.0]);
    vector.as_vector_mut()[5] = -1.0;
    assert_eq!(vector.into_vector()[5], -1.0);
    assert!(BlockVector::zeros(&[]).is_empty());
}

fn partitioned_matrix() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, DMatrix<f64>)> {
    let sizes = proptest::collection::vec(0..4usize, 1..4);
    (sizes.clone(), sizes).prop_flat_map(|(rows, cols)| {
        let (m, n) = (rows.iter().sum::<usize>(), cols.iter().sum::<usize>());
        // Roughly half of the entries are zero
        let entries = proptest::collection::vec(prop_oneof![Just(0.0), -5.0..5.0], m * n);
        (Just(rows), Just(cols), entries.prop_map(move |v| DMatrix::from_vec(m, n, v)))
    })
}

proptest! {
    #[test]
    fn monolithic_matrix_reassembles_blocks((rows, cols, matrix) in partitioned_matrix()) {
        let blocks = block_matrix_from_dense(&rows, &cols, &matrix);
        assert_matrix_eq!(dense(&blocks.to_monolithic()), matrix);
        assert_matrix_eq!(dense(&blocks.transpose().to_monolithic()), matrix.transpose());
        prop_assert_eq!(blocks.transpose().row_block_sizes(), cols);
    }
}
