//! Extraction of spatial fields from space-time solution vectors.
use nalgebra::{DVector, DVectorView};

/// Describes the layout of a space-time solution vector.
///
/// All hierarchical temporal functions vanish at the initial and end time, so the spatial fields
/// at these times are stored in the first space-time block alone, which pairs the nodal temporal
/// basis with the finest spatial level. The first and last nodal functions give the fields at the
/// initial and end time respectively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionHandler {
    num_temperature_dofs: usize,
    num_flux_dofs: usize,
    num_time_nodes: usize,
    num_spatial_temperature_dofs: usize,
    num_spatial_flux_dofs: usize,
}

impl SolutionHandler {
    /// # Panics
    ///
    /// Panics if the first space-time block does not fit into the temperature or heat flux part.
    pub fn new(
        num_temperature_dofs: usize,
        num_flux_dofs: usize,
        num_time_nodes: usize,
        num_spatial_temperature_dofs: usize,
        num_spatial_flux_dofs: usize,
    ) -> Self {
        assert!(num_time_nodes >= 2, "The nodal temporal basis has at least two functions");
        assert!(num_time_nodes * num_spatial_temperature_dofs <= num_temperature_dofs);
        assert!(num_time_nodes * num_spatial_flux_dofs <= num_flux_dofs);
        Self {
            num_temperature_dofs,
            num_flux_dofs,
            num_time_nodes,
            num_spatial_temperature_dofs,
            num_spatial_flux_dofs,
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.num_temperature_dofs + self.num_flux_dofs
    }

    fn check_len(&self, solution: &DVector<f64>) {
        assert_eq!(solution.len(), self.num_dofs(), "Solution vector has wrong length");
    }

    /// The temperature part of the solution.
    pub fn temperature<'s>(&self, solution: &'s DVector<f64>) -> DVectorView<'s, f64> {
        self.check_len(solution);
        solution.rows(0, self.num_temperature_dofs)
    }

    /// The heat flux part of the solution.
    pub fn heat_flux<'s>(&self, solution: &'s DVector<f64>) -> DVectorView<'s, f64> {
        self.check_len(solution);
        solution.rows(self.num_temperature_dofs, self.num_flux_dofs)
    }

    pub fn temperature_at_initial_time<'s>(&self, solution: &'s DVector<f64>) -> DVectorView<'s, f64> {
        self.check_len(solution);
        solution.rows(0, self.num_spatial_temperature_dofs)
    }

    pub fn temperature_at_end_time<'s>(&self, solution: &'s DVector<f64>) -> DVectorView<'s, f64> {
        self.check_len(solution);
        let shift = (self.num_time_nodes - 1) * self.num_spatial_temperature_dofs;
        solution.rows(shift, self.num_spatial_temperature_dofs)
    }

    pub fn heat_flux_at_initial_time<'s>(&self, solution: &'s DVector<f64>) -> DVectorView<'s, f64> {
        self.check_len(solution);
        solution.rows(self.num_temperature_dofs, self.num_spatial_flux_dofs)
    }

    pub fn heat_flux_at_end_time<'s>(&self, solution: &'s DVector<f64>) -> DVectorView<'s, f64> {
        self.check_len(solution);
        let shift = self.num_temperature_dofs + (self.num_time_nodes - 1) * self.num_spatial_flux_dofs;
        solution.rows(shift, self.num_spatial_flux_dofs)
    }
}
