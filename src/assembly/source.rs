//! Load vectors for scalar and vector-valued spaces.
use crate::assembly::local::same_level_quadrature_points;
use crate::quadrature::QuadraturePair2d;
use crate::space::{ScalarFiniteElementSpace, VectorFiniteElementSpace};
use nalgebra::{DVector, Point2};

/// Assembles the vector with entries `(f, v_i)`.
pub fn assemble_scalar_load_vector<S, F>(space: &S, f: F, quadrature: &QuadraturePair2d) -> DVector<f64>
where
    S: ?Sized + ScalarFiniteElementSpace,
    F: Fn(&Point2<f64>) -> f64,
{
    let n = space.element_dof_count();
    let mut dofs = vec![0; n];
    let mut phi = vec![0.0; n];
    let mut load = DVector::zeros(space.num_dofs());
    for element_index in 0..space.num_elements() {
        space.populate_element_dofs(element_index, &mut dofs);
        for p in same_level_quadrature_points(quadrature, space.mesh(), element_index) {
            space.populate_element_basis(element_index, &mut phi, &p.test_coords);
            let f_p = f(&p.point);
            for (&dof, phi_i) in dofs.iter().zip(&phi) {
                load[dof] += p.weight * f_p * phi_i;
            }
        }
    }
    load
}

/// Assembles the vector with entries `(f, div r_i)`.
pub fn assemble_divergence_load_vector<S, F>(space: &S, f: F, quadrature: &QuadraturePair2d) -> DVector<f64>
where
    S: ?Sized + VectorFiniteElementSpace,
    F: Fn(&Point2<f64>) -> f64,
{
    let n = space.element_dof_count();
    let mut dofs = vec![0; n];
    let mut div = vec![0.0; n];
    let mut load = DVector::zeros(space.num_dofs());
    for element_index in 0..space.num_elements() {
        space.populate_element_dofs(element_index, &mut dofs);
        for p in same_level_quadrature_points(quadrature, space.mesh(), element_index) {
            space.populate_element_divergence(element_index, &mut div, &p.test_coords);
            let f_p = f(&p.point);
            for (&dof, div_i) in dofs.iter().zip(&div) {
                load[dof] += p.weight * f_p * div_i;
            }
        }
    }
    load
}
