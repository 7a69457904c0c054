//! Closed-form block matrices for the one-dimensional hierarchical hat basis in time.
//!
//! The temporal levels `min_level..=max_level` are stored as blocks `0..num_levels`. Block 0
//! holds the standard nodal basis on the uniform mesh with `2^min_level` intervals. Block
//! `m >= 1` holds only the hat functions introduced by refinement to `2^(min_level + m)`
//! intervals, one per new midpoint. The hat function `k` of block `m >= 1` is centered at
//! `(2k + 1) h_m` and supported on `[2k h_m, (2k + 2) h_m]`, with `h_m = T / 2^(min_level + m)`.
//!
//! All matrices are tabulated exactly from the piecewise linear basis, without quadrature.
use crate::block::{offsets_from_sizes, BlockMatrix};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};

/// A contiguous range of dyadic temporal refinement levels on `[0, end_time]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalLevels {
    end_time: f64,
    min_level: u32,
    max_level: u32,
}

impl TemporalLevels {
    /// # Panics
    ///
    /// Panics if `end_time` is not positive or if `min_level > max_level`.
    pub fn new(end_time: f64, min_level: u32, max_level: u32) -> Self {
        assert!(end_time > 0.0, "End time must be positive");
        assert!(min_level <= max_level, "Minimum level must not exceed maximum level");
        Self {
            end_time,
            min_level,
            max_level,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn min_level(&self) -> u32 {
        self.min_level
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn num_levels(&self) -> usize {
        (self.max_level - self.min_level + 1) as usize
    }

    /// Width `h_i = T / 2^(min_level + i)` of the intervals of block `i`.
    pub fn mesh_width(&self, block: usize) -> f64 {
        self.end_time / 2f64.powi((self.min_level as usize + block) as i32)
    }

    pub fn block_size(&self, block: usize) -> usize {
        if block == 0 {
            (1 << self.min_level) + 1
        } else {
            1 << (self.min_level as usize + block - 1)
        }
    }

    pub fn block_sizes(&self) -> Vec<usize> {
        (0..self.num_levels()).map(|i| self.block_size(i)).collect()
    }

    pub fn block_offsets(&self) -> Vec<usize> {
        offsets_from_sizes(&self.block_sizes())
    }

    pub fn num_dofs(&self) -> usize {
        self.block_sizes().iter().sum()
    }

    /// Closed interval on which basis function `index` of block `block` is non-zero.
    pub fn support(&self, block: usize, index: usize) -> [f64; 2] {
        let h = self.mesh_width(block);
        if block == 0 {
            let t = index as f64 * h;
            [(t - h).max(0.0), (t + h).min(self.end_time)]
        } else {
            [2.0 * index as f64 * h, (2 * index + 2) as f64 * h]
        }
    }

    fn center(&self, block: usize, index: usize) -> f64 {
        let h = self.mesh_width(block);
        if block == 0 {
            index as f64 * h
        } else {
            (2 * index + 1) as f64 * h
        }
    }

    /// Evaluates basis function `index` of block `block` and its derivative at time `t`.
    ///
    /// At the kinks of the function, the derivative is taken from the right.
    pub fn evaluate(&self, block: usize, index: usize, t: f64) -> (f64, f64) {
        let h = self.mesh_width(block);
        let [a, b] = self.support(block, index);
        if t < a || t > b {
            return (0.0, 0.0);
        }
        let c = self.center(block, index);
        let value = 1.0 - (t - c).abs() / h;
        let derivative = if t < c { 1.0 / h } else if t < b { -1.0 / h } else { 0.0 };
        (value, derivative)
    }

    /// Number of uniform intervals of width `mesh_width(block)` covering the supports of the
    /// block's basis functions.
    pub fn num_intervals(&self, block: usize) -> usize {
        1 << (self.min_level as usize + block)
    }

    pub fn interval(&self, block: usize, interval: usize) -> [f64; 2] {
        let h = self.mesh_width(block);
        [interval as f64 * h, (interval + 1) as f64 * h]
    }

    /// Basis functions of the block that are non-zero on the given interval.
    pub fn interval_functions(&self, block: usize, interval: usize) -> Vec<usize> {
        if block == 0 {
            vec![interval, interval + 1]
        } else {
            vec![interval / 2]
        }
    }
}

/// A coarse ancestor basis function covering a finer hierarchical function.
#[derive(Debug, Copy, Clone)]
struct Ancestor {
    index: usize,
    /// Position of the fine function's center within the monotone part of the ancestor, counted
    /// in fine mesh widths from the zero of the ancestor: the center lies at `(2 offset + 1) h_m`.
    offset: usize,
    /// Whether the fine function lies on the increasing part of the ancestor.
    rising: bool,
}

/// The hierarchical function of a block `gap` levels coarser which covers fine function `i`.
fn hierarchical_ancestor(gap: usize, i: usize) -> Ancestor {
    let factor = 1 << gap;
    let half = factor / 2;
    let jj = i % factor;
    let rising = jj < half;
    Ancestor {
        index: i / factor,
        offset: if rising { jj } else { factor - jj - 1 },
        rising,
    }
}

/// The two nodal functions of block 0 which cover fine function `i` of block `m`.
fn standard_ancestors(m: usize, i: usize) -> [Ancestor; 2] {
    let factor = 1 << m;
    let half = factor / 2;
    let jj = i % factor;
    let left_half = jj < half;
    let odd = Ancestor {
        index: 2 * (i / factor) + 1,
        offset: if left_half { jj } else { factor - jj - 1 },
        rising: left_half,
    };
    let even = Ancestor {
        index: 2 * (i / factor) + if left_half { 0 } else { 2 },
        offset: if left_half { half - jj - 1 } else { jj - half },
        rising: !left_half,
    };
    [odd, even]
}

/// Ancestors of function `i` of block `m` in the coarser block `n`.
fn ancestors(m: usize, n: usize, i: usize) -> Vec<Ancestor> {
    debug_assert!(n < m);
    if n == 0 {
        standard_ancestors(m, i).to_vec()
    } else {
        vec![hierarchical_ancestor(m - n, i)]
    }
}

fn tridiagonal(n: usize, end_diagonal: f64, diagonal: f64, lower: f64, upper: f64) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    for i in 0..n {
        let d = if i == 0 || i + 1 == n { end_diagonal } else { diagonal };
        coo.push(i, i, d);
        if i > 0 {
            coo.push(i, i - 1, lower);
        }
        if i + 1 < n {
            coo.push(i, i + 1, upper);
        }
    }
    CsrMatrix::from(&coo)
}

fn scaled_identity(n: usize, value: f64) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(n, n);
    for i in 0..n {
        coo.push(i, i, value);
    }
    CsrMatrix::from(&coo)
}

/// Fills the lower cross-level blocks with `entry(h_m, h_n, ancestor)` and the upper blocks with
/// `upper_sign` times their transposes.
fn fill_cross_level_blocks<F>(levels: &TemporalLevels, matrix: &mut BlockMatrix, upper_sign: f64, entry: F)
where
    F: Fn(f64, f64, &Ancestor) -> f64,
{
    for m in 1..levels.num_levels() {
        let h_m = levels.mesh_width(m);
        for n in 0..m {
            let h_n = levels.mesh_width(n);
            let mut coo = CooMatrix::new(levels.block_size(m), levels.block_size(n));
            for i in 0..levels.block_size(m) {
                for ancestor in ancestors(m, n, i) {
                    coo.push(i, ancestor.index, entry(h_m, h_n, &ancestor));
                }
            }
            let lower = CsrMatrix::from(&coo);
            let mut upper = lower.transpose();
            for v in upper.values_mut() {
                *v *= upper_sign;
            }
            matrix.set_block(m, n, lower);
            matrix.set_block(n, m, upper);
        }
    }
}

/// The mass matrix with entries `∫ φ_i φ_j dt`.
pub fn assemble_mass_matrix(levels: &TemporalLevels) -> BlockMatrix {
    let sizes = levels.block_sizes();
    let mut matrix = BlockMatrix::zeros(&sizes, &sizes);

    let h0 = levels.mesh_width(0);
    matrix.set_block(0, 0, tridiagonal(sizes[0], h0 / 3.0, 2.0 * h0 / 3.0, h0 / 6.0, h0 / 6.0));
    for m in 1..levels.num_levels() {
        let h = levels.mesh_width(m);
        matrix.set_block(m, m, scaled_identity(sizes[m], 2.0 * h / 3.0));
    }

    // The coarse function is linear on the fine support, so the entry is h_m times its value
    // at the fine center
    fill_cross_level_blocks(levels, &mut matrix, 1.0, |h_m, h_n, ancestor| {
        (2 * ancestor.offset + 1) as f64 * h_m * h_m / h_n
    });
    matrix
}

/// The stiffness matrix with entries `∫ φ_i' φ_j' dt`.
///
/// All cross-level blocks vanish, since coarse derivatives are constant on the support of every
/// finer hierarchical function, whose derivative integrates to zero.
pub fn assemble_stiffness_matrix(levels: &TemporalLevels) -> BlockMatrix {
    let sizes = levels.block_sizes();
    let mut matrix = BlockMatrix::zeros(&sizes, &sizes);

    let h0 = levels.mesh_width(0);
    matrix.set_block(0, 0, tridiagonal(sizes[0], 1.0 / h0, 2.0 / h0, -1.0 / h0, -1.0 / h0));
    for m in 1..levels.num_levels() {
        let h = levels.mesh_width(m);
        matrix.set_block(m, m, scaled_identity(sizes[m], 2.0 / h));
    }
    matrix
}

/// The gradient matrix with entries `G_ij = ∫ φ_j' φ_i dt`.
///
/// Hierarchical functions vanish at both ends of their supports, so integration by parts gives
/// upper cross-level blocks that are the negated transposes of the lower ones.
pub fn assemble_gradient_matrix(levels: &TemporalLevels) -> BlockMatrix {
    let sizes = levels.block_sizes();
    let mut matrix = BlockMatrix::zeros(&sizes, &sizes);

    let n = sizes[0];
    let mut coo = CooMatrix::new(n, n);
    coo.push(0, 0, -0.5);
    coo.push(n - 1, n - 1, 0.5);
    for i in 0..n {
        if i > 0 {
            coo.push(i, i - 1, -0.5);
        }
        if i + 1 < n {
            coo.push(i, i + 1, 0.5);
        }
    }
    matrix.set_block(0, 0, CsrMatrix::from(&coo));

    fill_cross_level_blocks(levels, &mut matrix, -1.0, |h_m, h_n, ancestor| {
        let sign = if ancestor.rising { 1.0 } else { -1.0 };
        sign * h_m / h_n
    });
    matrix
}

/// The initial-trace matrix with entries `φ_i(0) φ_j(0)`.
///
/// Only the first nodal function of block 0 is non-zero at time zero.
pub fn assemble_initial_matrix(levels: &TemporalLevels) -> BlockMatrix {
    let sizes = levels.block_sizes();
    let mut matrix = BlockMatrix::zeros(&sizes, &sizes);
    let mut coo = CooMatrix::new(sizes[0], sizes[0]);
    coo.push(0, 0, 1.0);
    matrix.set_block(0, 0, CsrMatrix::from(&coo));
    matrix
}
