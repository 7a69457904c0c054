//! Block-partitioned sparse matrices and dense vectors.
//!
//! Blocks are indexed by level pairs. Offsets are derived from the per-block sizes, so block `i`
//! of a vector occupies the range `offsets[i]..offsets[i + 1]`.
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Computes the offsets `[0, s_0, s_0 + s_1, ...]` of blocks with the given sizes.
pub fn offsets_from_sizes(sizes: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(sizes.len() + 1);
    offsets.push(0);
    let mut total = 0;
    for &size in sizes {
        total += size;
        offsets.push(total);
    }
    offsets
}

/// A matrix partitioned into a grid of sparse blocks, stored in row-major block order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMatrix {
    row_offsets: Vec<usize>,
    col_offsets: Vec<usize>,
    blocks: Vec<CsrMatrix<f64>>,
}

impl BlockMatrix {
    /// Creates a block matrix in which every block is empty.
    pub fn zeros(row_sizes: &[usize], col_sizes: &[usize]) -> Self {
        let blocks = row_sizes
            .iter()
            .flat_map(|&r| col_sizes.iter().map(move |&c| CsrMatrix::zeros(r, c)))
            .collect();
        Self {
            row_offsets: offsets_from_sizes(row_sizes),
            col_offsets: offsets_from_sizes(col_sizes),
            blocks,
        }
    }

    /// Creates a block matrix from blocks given in row-major block order.
    ///
    /// # Panics
    ///
    /// Panics if the number of blocks or the shape of any block does not match the given sizes.
    pub fn from_blocks(row_sizes: &[usize], col_sizes: &[usize], blocks: Vec<CsrMatrix<f64>>) -> Self {
        assert_eq!(blocks.len(), row_sizes.len() * col_sizes.len(), "Wrong number of blocks");
        let mut matrix = Self::zeros(row_sizes, col_sizes);
        let num_block_cols = col_sizes.len();
        for (idx, block) in blocks.into_iter().enumerate() {
            matrix.set_block(idx / num_block_cols, idx % num_block_cols, block);
        }
        matrix
    }

    pub fn num_block_rows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    pub fn num_block_cols(&self) -> usize {
        self.col_offsets.len() - 1
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    pub fn col_offsets(&self) -> &[usize] {
        &self.col_offsets
    }

    pub fn row_block_sizes(&self) -> Vec<usize> {
        self.row_offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn col_block_sizes(&self) -> Vec<usize> {
        self.col_offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn nrows(&self) -> usize {
        *self.row_offsets.last().expect("Offsets are never empty")
    }

    pub fn ncols(&self) -> usize {
        *self.col_offsets.last().expect("Offsets are never empty")
    }

    fn block_index(&self, i: usize, j: usize) -> usize {
        assert!(i < self.num_block_rows() && j < self.num_block_cols(), "Block index out of bounds");
        i * self.num_block_cols() + j
    }

    pub fn block(&self, i: usize, j: usize) -> &CsrMatrix<f64> {
        &self.blocks[self.block_index(i, j)]
    }

    /// Replaces block `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if the shape of the new block does not match the partition.
    pub fn set_block(&mut self, i: usize, j: usize, block: CsrMatrix<f64>) {
        let idx = self.block_index(i, j);
        assert_eq!(
            block.nrows(),
            self.row_offsets[i + 1] - self.row_offsets[i],
            "Block ({}, {}) has wrong number of rows",
            i,
            j
        );
        assert_eq!(
            block.ncols(),
            self.col_offsets[j + 1] - self.col_offsets[j],
            "Block ({}, {}) has wrong number of columns",
            i,
            j
        );
        self.blocks[idx] = block;
    }

    pub fn transpose(&self) -> Self {
        let mut result = Self::zeros(&self.col_block_sizes(), &self.row_block_sizes());
        for i in 0..self.num_block_rows() {
            for j in 0..self.num_block_cols() {
                result.set_block(j, i, self.block(i, j).transpose());
            }
        }
        result
    }

    /// Assembles all blocks into a single sparse matrix.
    pub fn to_monolithic(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.nrows(), self.ncols());
        for i in 0..self.num_block_rows() {
            for j in 0..self.num_block_cols() {
                let (r0, c0) = (self.row_offsets[i], self.col_offsets[j]);
                for (r, c, &v) in self.block(i, j).triplet_iter() {
                    coo.push(r0 + r, c0 + c, v);
                }
            }
        }
        CsrMatrix::from(&coo)
    }
}

/// A dense vector partitioned into consecutive blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockVector {
    offsets: Vec<usize>,
    data: DVector<f64>,
}

impl BlockVector {
    pub fn zeros(sizes: &[usize]) -> Self {
        let offsets = offsets_from_sizes(sizes);
        let len = *offsets.last().expect("Offsets are never empty");
        Self {
            offsets,
            data: DVector::zeros(len),
        }
    }

    /// # Panics
    ///
    /// Panics if the length of `data` does not match the total size of the blocks.
    pub fn from_vector(sizes: &[usize], data: DVector<f64>) -> Self {
        let offsets = offsets_from_sizes(sizes);
        assert_eq!(
            *offsets.last().expect("Offsets are never empty"),
            data.len(),
            "Vector length does not match block sizes"
        );
        Self { offsets, data }
    }

    pub fn num_blocks(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn block(&self, i: usize) -> DVectorView<'_, f64> {
        let (start, end) = (self.offsets[i], self.offsets[i + 1]);
        self.data.rows(start, end - start)
    }

    pub fn block_mut(&mut self, i: usize) -> DVectorViewMut<'_, f64> {
        let (start, end) = (self.offsets[i], self.offsets[i + 1]);
        self.data.rows_mut(start, end - start)
    }

    pub fn as_vector(&self) -> &DVector<f64> {
        &self.data
    }

    pub fn as_vector_mut(&mut self) -> &mut DVector<f64> {
        &mut self.data
    }

    pub fn into_vector(self) -> DVector<f64> {
        self.data
    }
}
