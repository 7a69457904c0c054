//! Preconditioned Conjugate Gradient for symmetric positive definite systems.
use core::fmt;
use nalgebra::{DVector, RealField};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use std::error::Error;

pub type BoxedError = Box<dyn Error + Send + Sync>;

pub trait LinearOperator<T: RealField> {
    /// Computes `y = A x`.
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), BoxedError>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: RealField,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), BoxedError> {
        <A as LinearOperator<T>>::apply(self, y, x)
    }
}

impl<T> LinearOperator<T> for CsrMatrix<T>
where
    T: RealField + Copy,
{
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), BoxedError> {
        if self.ncols() != x.len() || self.nrows() != y.len() {
            return Err(format!(
                "Operator of shape {}x{} cannot map vector of length {} to vector of length {}",
                self.nrows(),
                self.ncols(),
                x.len(),
                y.len()
            )
            .into());
        }
        spmm_csr_dense(T::zero(), &mut *y, T::one(), Op::NoOp(self), Op::NoOp(&*x));
        Ok(())
    }
}

/// The identity, used as the preconditioner when none is given.
pub struct IdentityOperator;

impl<T: RealField> LinearOperator<T> for IdentityOperator {
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), BoxedError> {
        y.copy_from(x);
        Ok(())
    }
}

/// Jacobi (diagonal) preconditioner.
///
/// Rows with a zero diagonal are left unscaled.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner<T: RealField> {
    inverse_diagonal: DVector<T>,
}

impl<T: RealField + Copy> JacobiPreconditioner<T> {
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Self {
        let mut inverse_diagonal = DVector::repeat(matrix.nrows(), T::one());
        for (i, row) in matrix.row_iter().enumerate() {
            if let Some(pos) = row.col_indices().iter().position(|&j| j == i) {
                let d = row.values()[pos];
                if d != T::zero() {
                    inverse_diagonal[i] = T::one() / d;
                }
            }
        }
        Self { inverse_diagonal }
    }
}

impl<T: RealField + Copy> LinearOperator<T> for JacobiPreconditioner<T> {
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), BoxedError> {
        y.copy_from(x);
        y.component_mul_assign(&self.inverse_diagonal);
        Ok(())
    }
}

pub trait CgStoppingCriterion<T: RealField> {
    fn has_converged(&self, b_norm: T, iteration: usize, approx_residual: &DVector<T>) -> bool;
}

/// Relative residual tolerance ||r|| <= tol * ||b||.
///
/// Note that we use the *approximate* residual given by Conjugate-Gradient, which may drift from
/// the true residual for ill-conditioned systems.
#[derive(Debug, Clone)]
pub struct RelativeResidualCriterion<T: RealField> {
    tol: T,
}

impl<T: RealField> RelativeResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }
}

impl Default for RelativeResidualCriterion<f64> {
    fn default() -> Self {
        Self::new(1e-10)
    }
}

impl<T: RealField + Copy> CgStoppingCriterion<T> for RelativeResidualCriterion<T> {
    fn has_converged(&self, b_norm: T, _iteration: usize, approx_residual: &DVector<T>) -> bool {
        approx_residual.norm() <= self.tol * b_norm
    }
}

#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct CgWorkspace<T: RealField> {
    r: DVector<T>,
    z: DVector<T>,
    p: DVector<T>,
    Ap: DVector<T>,
}

impl<T: RealField> Default for CgWorkspace<T> {
    fn default() -> Self {
        Self {
            r: DVector::zeros(0),
            z: DVector::zeros(0),
            p: DVector::zeros(0),
            Ap: DVector::zeros(0),
        }
    }
}

impl<T: RealField> CgWorkspace<T> {
    fn resize(&mut self, dim: usize) {
        self.r.resize_vertically_mut(dim, T::zero());
        self.z.resize_vertically_mut(dim, T::zero());
        self.p.resize_vertically_mut(dim, T::zero());
        self.Ap.resize_vertically_mut(dim, T::zero());
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(BoxedError),
    PreconditionerError(BoxedError),
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => write!(f, "Error applying operator: {}", err),
            Self::PreconditionerError(err) => write!(f, "Error applying preconditioner: {}", err),
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner"),
            Self::MaxIterationsReached { max_iter } => {
                write!(f, "Max iterations ({}) reached", max_iter)
            }
        }
    }
}

#[derive(Debug)]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl SolveError {
    fn new(output: CgOutput, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CG solve failed after {} iterations: {}",
            self.output.num_iterations, self.kind
        )
    }
}

impl Error for SolveError {}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CgOutput {
    /// Number of updates made to the (initial) solution vector.
    pub num_iterations: usize,
}

#[derive(Debug)]
pub struct ConjugateGradient<T: RealField, A, P, Criterion> {
    workspace: CgWorkspace<T>,
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
}

impl<T: RealField> ConjugateGradient<T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            workspace: CgWorkspace::default(),
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<T: RealField> Default for ConjugateGradient<T, (), IdentityOperator, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField, P, Criterion> ConjugateGradient<T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<T: RealField, A, P, Criterion> ConjugateGradient<T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<T, A, P2, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<T: RealField, A, P> ConjugateGradient<T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(self, stopping_criterion: Criterion) -> ConjugateGradient<T, A, P, Criterion> {
        ConjugateGradient {
            workspace: self.workspace,
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<T, A, P, Criterion> ConjugateGradient<T, A, P, Criterion>
where
    T: RealField + Copy,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: CgStoppingCriterion<T>,
{
    /// Solves `A x = b`, using the contents of `x` as the initial guess.
    #[allow(non_snake_case)]
    pub fn solve_with_guess(&mut self, b: &DVector<T>, x: &mut DVector<T>) -> Result<CgOutput, SolveError> {
        use SolveErrorKind::*;
        assert_eq!(b.len(), x.len());

        let mut output = CgOutput { num_iterations: 0 };
        self.workspace.resize(x.len());
        let CgWorkspace { r, z, p, Ap } = &mut self.workspace;

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        // r = b - Ax
        if let Err(err) = self.operator.apply(r, x) {
            return Err(SolveError::new(output, OperatorError(err)));
        }
        r.zip_apply(b, |Ax_i, b_i| *Ax_i = b_i - *Ax_i);

        // z = Pr
        if let Err(err) = self.preconditioner.apply(z, r) {
            return Err(SolveError::new(output, PreconditionerError(err)));
        }
        p.copy_from(z);
        let mut zTr = z.dot(r);

        loop {
            if self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations, r)
            {
                break;
            } else if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(SolveError::new(output, MaxIterationsReached { max_iter }));
                }
            }

            // Ap = A * p
            if let Err(err) = self.operator.apply(Ap, p) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            let pAp = p.dot(Ap);

            if pAp <= T::zero() {
                return Err(SolveError::new(output, IndefiniteOperator));
            }
            if zTr <= T::zero() {
                return Err(SolveError::new(output, IndefinitePreconditioner));
            }

            let alpha = zTr / pAp;
            x.axpy(alpha, p, T::one());
            r.axpy(-alpha, Ap, T::one());
            output.num_iterations += 1;

            // z = P r
            if let Err(err) = self.preconditioner.apply(z, r) {
                return Err(SolveError::new(output, PreconditionerError(err)));
            }
            let zTr_next = z.dot(r);
            let beta = zTr_next / zTr;

            // p = z + beta * p
            p.axpy(T::one(), z, beta);
            zTr = zTr_next;
        }

        log::debug!("CG converged after {} iterations", output.num_iterations);
        Ok(output)
    }
}
