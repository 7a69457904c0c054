//! Basic operations on CSR matrices.
use nalgebra::{DVector, RealField};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Computes the Kronecker (outer) product $A \otimes B$.
///
/// Entry $(i \cdot m_B + k, j \cdot n_B + l)$ of the result is $A_{ij} B_{kl}$, where $m_B \times n_B$
/// is the shape of $B$. The result is built row by row, so no sorting or coalescing is required.
pub fn kronecker_product<T>(a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> CsrMatrix<T>
where
    T: RealField + Copy,
{
    let nrows = a.nrows() * b.nrows();
    let ncols = a.ncols() * b.ncols();

    let mut row_offsets = Vec::with_capacity(nrows + 1);
    let mut col_indices = Vec::with_capacity(a.nnz() * b.nnz());
    let mut values = Vec::with_capacity(a.nnz() * b.nnz());

    row_offsets.push(0);
    for a_row in a.row_iter() {
        for b_row in b.row_iter() {
            for (&a_col, &a_val) in a_row.col_indices().iter().zip(a_row.values()) {
                for (&b_col, &b_val) in b_row.col_indices().iter().zip(b_row.values()) {
                    col_indices.push(a_col * b.ncols() + b_col);
                    values.push(a_val * b_val);
                }
            }
            row_offsets.push(col_indices.len());
        }
    }

    CsrMatrix::try_from_csr_data(nrows, ncols, row_offsets, col_indices, values)
        .expect("Kronecker product of valid CSR matrices must itself be valid")
}

/// Computes $\alpha A + \beta B$.
///
/// The sparsity pattern of the result is the union of the patterns of $A$ and $B$.
///
/// # Panics
///
/// Panics if the shapes of the matrices differ.
pub fn add_scaled<T>(alpha: T, a: &CsrMatrix<T>, beta: T, b: &CsrMatrix<T>) -> CsrMatrix<T>
where
    T: RealField + Copy,
{
    assert_eq!(a.nrows(), b.nrows(), "Row counts must match");
    assert_eq!(a.ncols(), b.ncols(), "Column counts must match");
    a * alpha + b * beta
}

/// Computes $A + B$.
pub fn add<T>(a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> CsrMatrix<T>
where
    T: RealField + Copy,
{
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()), "Matrix shapes must match");
    a + b
}

/// Eliminates the given rows and columns of a square matrix.
///
/// All entries in the eliminated rows and columns are removed, and the diagonal entries of the
/// eliminated indices are set to one. Duplicate indices are allowed.
///
/// # Panics
///
/// Panics if the matrix is not square or an index is out of bounds.
pub fn eliminate_rows_and_cols<T>(a: &CsrMatrix<T>, indices: &[usize]) -> CsrMatrix<T>
where
    T: RealField + Copy,
{
    assert_eq!(a.nrows(), a.ncols(), "Elimination requires a square matrix");
    let mut eliminated = vec![false; a.nrows()];
    for &idx in indices {
        assert!(idx < a.nrows(), "Index {} out of bounds for {} rows", idx, a.nrows());
        eliminated[idx] = true;
    }

    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (i, j, &v) in a.triplet_iter() {
        if !eliminated[i] && !eliminated[j] {
            coo.push(i, j, v);
        }
    }
    for (idx, _) in eliminated.iter().enumerate().filter(|(_, e)| **e) {
        coo.push(idx, idx, T::one());
    }
    CsrMatrix::from(&coo)
}

/// Sets the given entries of a vector to zero.
pub fn zero_entries<T>(v: &mut DVector<T>, indices: &[usize])
where
    T: RealField + Copy,
{
    for &idx in indices {
        v[idx] = T::zero();
    }
}
