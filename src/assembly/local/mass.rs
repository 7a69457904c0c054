use crate::assembly::local::{
    default_quadrature, fine_test_quadrature_points, same_level_quadrature_points, BlockBilinearFormIntegrator,
    PairedQuadraturePoint,
};
use crate::quadrature::QuadraturePair2d;
use crate::space::{ScalarFiniteElementSpace, VectorFiniteElementSpace};
use nalgebra::{DMatrixViewMut, Vector2};

/// The scalar mass form `(u, v)`.
#[derive(Debug, Clone)]
pub struct SpatialMassIntegrator {
    quadrature: QuadraturePair2d,
}

impl SpatialMassIntegrator {
    pub fn new() -> Self {
        Self {
            quadrature: default_quadrature(),
        }
    }

    pub fn with_quadrature(self, quadrature: QuadraturePair2d) -> Self {
        Self { quadrature }
    }
}

impl Default for SpatialMassIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble_scalar_mass<S>(
    test_space: &S,
    test_element: usize,
    trial_space: &S,
    trial_element: usize,
    points: &[PairedQuadraturePoint],
    mut output: DMatrixViewMut<f64>,
) where
    S: ?Sized + ScalarFiniteElementSpace,
{
    let mut phi_test = vec![0.0; test_space.element_dof_count()];
    let mut phi_trial = vec![0.0; trial_space.element_dof_count()];
    output.fill(0.0);
    for p in points {
        test_space.populate_element_basis(test_element, &mut phi_test, &p.test_coords);
        trial_space.populate_element_basis(trial_element, &mut phi_trial, &p.trial_coords);
        for (i, phi_i) in phi_test.iter().enumerate() {
            for (j, phi_j) in phi_trial.iter().enumerate() {
                output[(i, j)] += p.weight * phi_i * phi_j;
            }
        }
    }
}

impl<S> BlockBilinearFormIntegrator<S> for SpatialMassIntegrator
where
    S: ?Sized + ScalarFiniteElementSpace,
{
    fn assemble_same_level(&self, space: &S, element_index: usize, output: DMatrixViewMut<f64>) -> eyre::Result<()> {
        let points = same_level_quadrature_points(&self.quadrature, space.mesh(), element_index);
        assemble_scalar_mass(space, element_index, space, element_index, &points, output);
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
        assemble_scalar_mass(fine_space, fine_element, coarse_space, coarse_element, &points, output);
        Ok(())
    }
}

/// The vector mass form `(q, r)` for vector-valued (flux) spaces.
#[derive(Debug, Clone)]
pub struct VectorFeMassIntegrator {
    quadrature: QuadraturePair2d,
}

impl VectorFeMassIntegrator {
    pub fn new() -> Self {
        Self {
            quadrature: default_quadrature(),
        }
    }

    pub fn with_quadrature(self, quadrature: QuadraturePair2d) -> Self {
        Self { quadrature }
    }
}

impl Default for VectorFeMassIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble_vector_mass<S>(
    test_space: &S,
    test_element: usize,
    trial_space: &S,
    trial_element: usize,
    points: &[PairedQuadraturePoint],
    mut output: DMatrixViewMut<f64>,
) where
    S: ?Sized + VectorFiniteElementSpace,
{
    let mut psi_test = vec![Vector2::zeros(); test_space.element_dof_count()];
    let mut psi_trial = vec![Vector2::zeros(); trial_space.element_dof_count()];
    output.fill(0.0);
    for p in points {
        test_space.populate_element_vector_basis(test_element, &mut psi_test, &p.test_coords);
        trial_space.populate_element_vector_basis(trial_element, &mut psi_trial, &p.trial_coords);
        for (i, psi_i) in psi_test.iter().enumerate() {
            for (j, psi_j) in psi_trial.iter().enumerate() {
                output[(i, j)] += p.weight * psi_i.dot(psi_j);
            }
        }
    }
}

impl<S> BlockBilinearFormIntegrator<S> for VectorFeMassIntegrator
where
    S: ?Sized + VectorFiniteElementSpace,
{
    fn assemble_same_level(&self, space: &S, element_index: usize, output: DMatrixViewMut<f64>) -> eyre::Result<()> {
        let points = same_level_quadrature_points(&self.quadrature, space.mesh(), element_index);
        assemble_vector_mass(space, element_index, space, element_index, &points, output);
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
        assemble_vector_mass(fine_space, fine_element, coarse_space, coarse_element, &points, output);
        Ok(())
    }
}
