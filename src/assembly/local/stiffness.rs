use crate::assembly::local::{
    default_quadrature, fine_test_quadrature_points, identity_coefficient, same_level_quadrature_points,
    BlockBilinearFormIntegrator, PairedQuadraturePoint,
};
use crate::quadrature::QuadraturePair2d;
use crate::space::{ScalarFiniteElementSpace, VectorFiniteElementSpace};
use nalgebra::{DMatrixViewMut, Matrix2, Point2, Vector2};

/// The weighted stiffness form `(Q ∇u, Q ∇v)` for a matrix-valued coefficient `Q(x)`.
///
/// A scalar coefficient `q` is represented by `q I`, so it enters the form squared.
#[derive(Debug, Clone)]
pub struct SpatialStiffnessIntegrator<F = fn(&Point2<f64>) -> Matrix2<f64>> {
    quadrature: QuadraturePair2d,
    coefficient: F,
}

impl SpatialStiffnessIntegrator {
    pub fn new() -> Self {
        Self {
            quadrature: default_quadrature(),
            coefficient: identity_coefficient,
        }
    }
}

impl Default for SpatialStiffnessIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> SpatialStiffnessIntegrator<F> {
    pub fn with_coefficient<G>(self, coefficient: G) -> SpatialStiffnessIntegrator<G>
    where
        G: Fn(&Point2<f64>) -> Matrix2<f64>,
    {
        SpatialStiffnessIntegrator {
            quadrature: self.quadrature,
            coefficient,
        }
    }

    pub fn with_quadrature(self, quadrature: QuadraturePair2d) -> Self {
        Self { quadrature, ..self }
    }
}

impl<F> SpatialStiffnessIntegrator<F>
where
    F: Fn(&Point2<f64>) -> Matrix2<f64>,
{
    fn assemble<S>(
        &self,
        test_space: &S,
        test_element: usize,
        trial_space: &S,
        trial_element: usize,
        points: &[PairedQuadraturePoint],
        mut output: DMatrixViewMut<f64>,
    ) where
        S: ?Sized + ScalarFiniteElementSpace,
    {
        let mut grad_test = vec![Vector2::zeros(); test_space.element_dof_count()];
        let mut grad_trial = vec![Vector2::zeros(); trial_space.element_dof_count()];
        output.fill(0.0);
        for p in points {
            test_space.populate_element_gradients(test_element, &mut grad_test, &p.test_coords);
            trial_space.populate_element_gradients(trial_element, &mut grad_trial, &p.trial_coords);
            let q = (self.coefficient)(&p.point);
            for (i, g_i) in grad_test.iter().enumerate() {
                let q_g_i = q * g_i;
                for (j, g_j) in grad_trial.iter().enumerate() {
                    output[(i, j)] += p.weight * q_g_i.dot(&(q * g_j));
                }
            }
        }
    }
}

impl<S, F> BlockBilinearFormIntegrator<S> for SpatialStiffnessIntegrator<F>
where
    S: ?Sized + ScalarFiniteElementSpace,
    F: Fn(&Point2<f64>) -> Matrix2<f64>,
{
    fn assemble_same_level(&self, space: &S, element_index: usize, output: DMatrixViewMut<f64>) -> eyre::Result<()> {
        let points = same_level_quadrature_points(&self.quadrature, space.mesh(), element_index);
        self.assemble(space, element_index, space, element_index, &points, output);
        Ok(())
    }

    fn assemble_cross_level(
        &self,
        fine_space: &S,
        fine_element: usize,
        coarse_space: &S,
        coarse_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = fine_test_quadrature_points(
            &self.quadrature,
            fine_space.mesh(),
            fine_element,
            coarse_space.mesh(),
            coarse_element,
        )?;
        self.assemble(fine_space, fine_element, coarse_space, coarse_element, &points, output);
        Ok(())
    }
}

/// The divergence form `(div q, div r)` for vector-valued (flux) spaces.
#[derive(Debug, Clone)]
pub struct VectorFeStiffnessIntegrator {
    quadrature: QuadraturePair2d,
}

impl VectorFeStiffnessIntegrator {
    pub fn new() -> Self {
        Self {
            quadrature: default_quadrature(),
        }
    }

    pub fn with_quadrature(self, quadrature: QuadraturePair2d) -> Self {
        Self { quadrature }
    }
}

impl Default for VectorFeStiffnessIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble_div_div<S>(
    test_space: &S,
    test_element: usize,
    trial_space: &S,
    trial_element: usize,
    points: &[PairedQuadraturePoint],
    mut output: DMatrixViewMut<f64>,
) where
    S: ?Sized + VectorFiniteElementSpace,
{
    let mut div_test = vec![0.0; test_space.element_dof_count()];
    let mut div_trial = vec![0.0; trial_space.element_dof_count()];
    output.fill(0.0);
    for p in points {
        test_space.populate_element_divergence(test_element, &mut div_test, &p.test_coords);
        trial_space.populate_element_divergence(trial_element, &mut div_trial, &p.trial_coords);
        for (i, d_i) in div_test.iter().enumerate() {
            for (j, d_j) in div_trial.iter().enumerate() {
                output[(i, j)] += p.weight * d_i * d_j;
            }
        }
    }
}

impl<S> BlockBilinearFormIntegrator<S> for VectorFeStiffnessIntegrator
where
    S: ?Sized + VectorFiniteElementSpace,
{
    fn assemble_same_level(&self, space: &S, element_index: usize, output: DMatrixViewMut<f64>) -> eyre::Result<()> {
        let points = same_level_quadrature_points(&self.quadrature, space.mesh(), element_index);
        assemble_div_div(space, element_index, space, element_index, &points, output);
        Ok(())
    }

    fn assemble_cross_level(
        &self,
        fine_space: &S,
        fine_element: usize,
        coarse_space: &S,
        coarse_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = fine_test_quadrature_points(
            &self.quadrature,
            fine_space.mesh(),
            fine_element,
            coarse_space.mesh(),
            coarse_element,
        )?;
        assemble_div_div(fine_space, fine_element, coarse_space, coarse_element, &points, output);
        Ok(())
    }
}
