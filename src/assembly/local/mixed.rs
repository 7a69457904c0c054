use crate::assembly::local::{
    coarse_test_quadrature_points, default_quadrature, fine_test_quadrature_points, identity_coefficient,
    same_level_quadrature_points, BlockMixedBilinearFormIntegrator, PairedQuadraturePoint,
};
use crate::quadrature::QuadraturePair2d;
use crate::space::{ScalarFiniteElementSpace, VectorFiniteElementSpace};
use nalgebra::{DMatrixViewMut, Matrix2, Point2, Vector2};

/// The mixed form `(Q ∇u, r)` with scalar trial functions `u` and vector test functions `r`.
#[derive(Debug, Clone)]
pub struct VectorFeGradientIntegrator<F = fn(&Point2<f64>) -> Matrix2<f64>> {
    quadrature: QuadraturePair2d,
    coefficient: F,
}

impl VectorFeGradientIntegrator {
    pub fn new() -> Self {
        Self {
            quadrature: default_quadrature(),
            coefficient: identity_coefficient,
        }
    }
}

impl Default for VectorFeGradientIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> VectorFeGradientIntegrator<F> {
    pub fn with_coefficient<G>(self, coefficient: G) -> VectorFeGradientIntegrator<G>
    where
        G: Fn(&Point2<f64>) -> Matrix2<f64>,
    {
        VectorFeGradientIntegrator {
            quadrature: self.quadrature,
            coefficient,
        }
    }

    pub fn with_quadrature(self, quadrature: QuadraturePair2d) -> Self {
        Self { quadrature, ..self }
    }
}

impl<F> VectorFeGradientIntegrator<F>
where
    F: Fn(&Point2<f64>) -> Matrix2<f64>,
{
    fn assemble<Trial, Test>(
        &self,
        trial_space: &Trial,
        trial_element: usize,
        test_space: &Test,
        test_element: usize,
        points: &[PairedQuadraturePoint],
        mut output: DMatrixViewMut<f64>,
    ) where
        Trial: ?Sized + ScalarFiniteElementSpace,
        Test: ?Sized + VectorFiniteElementSpace,
    {
        let mut grad_trial = vec![Vector2::zeros(); trial_space.element_dof_count()];
        let mut psi_test = vec![Vector2::zeros(); test_space.element_dof_count()];
        output.fill(0.0);
        for p in points {
            trial_space.populate_element_gradients(trial_element, &mut grad_trial, &p.trial_coords);
            test_space.populate_element_vector_basis(test_element, &mut psi_test, &p.test_coords);
            let q = (self.coefficient)(&p.point);
            for (j, g_j) in grad_trial.iter().enumerate() {
                let q_g_j = q * g_j;
                for (i, psi_i) in psi_test.iter().enumerate() {
                    output[(i, j)] += p.weight * q_g_j.dot(psi_i);
                }
            }
        }
    }
}

impl<Trial, Test, F> BlockMixedBilinearFormIntegrator<Trial, Test> for VectorFeGradientIntegrator<F>
where
    Trial: ?Sized + ScalarFiniteElementSpace,
    Test: ?Sized + VectorFiniteElementSpace,
    F: Fn(&Point2<f64>) -> Matrix2<f64>,
{
    fn assemble_same_level(
        &self,
        trial_space: &Trial,
        test_space: &Test,
        element_index: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = same_level_quadrature_points(&self.quadrature, test_space.mesh(), element_index);
        self.assemble(trial_space, element_index, test_space, element_index, &points, output);
        Ok(())
    }

    fn assemble_cross_level(
        &self,
        fine_test_space: &Test,
        fine_element: usize,
        coarse_trial_space: &Trial,
        coarse_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = fine_test_quadrature_points(
            &self.quadrature,
            fine_test_space.mesh(),
            fine_element,
            coarse_trial_space.mesh(),
            coarse_element,
        )?;
        self.assemble(coarse_trial_space, coarse_element, fine_test_space, fine_element, &points, output);
        Ok(())
    }

    fn assemble_cross_level_reversed(
        &self,
        coarse_test_space: &Test,
        coarse_element: usize,
        fine_trial_space: &Trial,
        fine_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = coarse_test_quadrature_points(
            &self.quadrature,
            fine_trial_space.mesh(),
            fine_element,
            coarse_test_space.mesh(),
            coarse_element,
        )?;
        self.assemble(fine_trial_space, fine_element, coarse_test_space, coarse_element, &points, output);
        Ok(())
    }
}

/// The mixed form `(div q, v)` with vector trial functions `q` and scalar test functions `v`.
#[derive(Debug, Clone)]
pub struct VectorFeDivergenceIntegrator {
    quadrature: QuadraturePair2d,
}

impl VectorFeDivergenceIntegrator {
    pub fn new() -> Self {
        Self {
            quadrature: default_quadrature(),
        }
    }

    pub fn with_quadrature(self, quadrature: QuadraturePair2d) -> Self {
        Self { quadrature }
    }
}

impl Default for VectorFeDivergenceIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble_divergence<Trial, Test>(
    trial_space: &Trial,
    trial_element: usize,
    test_space: &Test,
    test_element: usize,
    points: &[PairedQuadraturePoint],
    mut output: DMatrixViewMut<f64>,
) where
    Trial: ?Sized + VectorFiniteElementSpace,
    Test: ?Sized + ScalarFiniteElementSpace,
{
    let mut div_trial = vec![0.0; trial_space.element_dof_count()];
    let mut phi_test = vec![0.0; test_space.element_dof_count()];
    output.fill(0.0);
    for p in points {
        trial_space.populate_element_divergence(trial_element, &mut div_trial, &p.trial_coords);
        test_space.populate_element_basis(test_element, &mut phi_test, &p.test_coords);
        for (i, phi_i) in phi_test.iter().enumerate() {
            for (j, d_j) in div_trial.iter().enumerate() {
                output[(i, j)] += p.weight * phi_i * d_j;
            }
        }
    }
}

impl<Trial, Test> BlockMixedBilinearFormIntegrator<Trial, Test> for VectorFeDivergenceIntegrator
where
    Trial: ?Sized + VectorFiniteElementSpace,
    Test: ?Sized + ScalarFiniteElementSpace,
{
    fn assemble_same_level(
        &self,
        trial_space: &Trial,
        test_space: &Test,
        element_index: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = same_level_quadrature_points(&self.quadrature, test_space.mesh(), element_index);
        assemble_divergence(trial_space, element_index, test_space, element_index, &points, output);
        Ok(())
    }

    fn assemble_cross_level(
        &self,
        fine_test_space: &Test,
        fine_element: usize,
        coarse_trial_space: &Trial,
        coarse_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = fine_test_quadrature_points(
            &self.quadrature,
            fine_test_space.mesh(),
            fine_element,
            coarse_trial_space.mesh(),
            coarse_element,
        )?;
        assemble_divergence(coarse_trial_space, coarse_element, fine_test_space, fine_element, &points, output);
        Ok(())
    }

    fn assemble_cross_level_reversed(
        &self,
        coarse_test_space: &Test,
        coarse_element: usize,
        fine_trial_space: &Trial,
        fine_element: usize,
        output: DMatrixViewMut<f64>,
    ) -> eyre::Result<()> {
        let points = coarse_test_quadrature_points(
            &self.quadrature,
            fine_trial_space.mesh(),
            fine_element,
            coarse_test_space.mesh(),
            coarse_element,
        )?;
        assemble_divergence(fine_trial_space, fine_element, coarse_test_space, coarse_element, &points, output);
        Ok(())
    }
}
