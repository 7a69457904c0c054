//! Least-squares space-time discretisation of the heat equation on sparse tensor products.
//!
//! The first-order system `∂u/∂t - div q = f`, `q = Q ∇u` is discretised by minimising the
//! residual of both equations together with the initial condition. Temperature and heat flux
//! are expanded in products of temporal basis functions with spatial finite element functions,
//! and only the products of temporal level `i` with spatial level `L - 1 - i` are kept, so that
//! the finest temporal resolution is paired with the coarsest spatial resolution and vice versa.
//!
//! Unknowns are ordered with all temperature degrees of freedom first, followed by all heat flux
//! degrees of freedom. Within each part, space-time block `i` holds the products for temporal
//! level `i`, with the temporal index as the outer index: the product of temporal function `j`
//! and spatial function `k` has index `j * n_x + k`, with `n_x` the number of spatial degrees of
//! freedom of the paired spatial level.
use crate::assembly::global::BlockFormAssembler;
use crate::assembly::local::{
    default_quadrature, SpatialMassIntegrator, SpatialStiffnessIntegrator, VectorFeDivergenceIntegrator,
    VectorFeGradientIntegrator, VectorFeMassIntegrator, VectorFeStiffnessIntegrator,
};
use crate::assembly::source::{assemble_divergence_load_vector, assemble_scalar_load_vector};
use crate::block::{offsets_from_sizes, BlockMatrix, BlockVector};
use crate::config::ConfigError;
use crate::hierarchy::{NestedFeHierarchy, NestedMeshHierarchy};
use crate::mesh::TriangleMesh2d;
use crate::problem::HeatProblem;
use crate::quadrature::univariate::gauss;
use crate::solution::SolutionHandler;
use crate::space::{
    FiniteElementSpace, LagrangeSpace, RaviartThomasSpace, ScalarFiniteElementSpace, VectorFiniteElementSpace,
    VectorLagrangeSpace,
};
use crate::temporal::{
    assemble_gradient_matrix, assemble_initial_matrix, assemble_mass_matrix, assemble_stiffness_matrix,
    TemporalLevels,
};
use core::fmt;
use eyre::eyre;
use log::{debug, info};
use nalgebra::{DVector, Point2};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use sparse_heat_linalg::ops::{add, add_scaled, eliminate_rows_and_cols, kronecker_product, zero_entries};
use std::str::FromStr;

pub mod dense;

/// The pair of spatial finite element spaces used for temperature and heat flux.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscretisationKind {
    /// Continuous piecewise linear temperature, lowest-order Raviart-Thomas heat flux.
    H1Hdiv,
    /// Continuous piecewise linear temperature and heat flux.
    H1H1,
}

impl DiscretisationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::H1Hdiv => "H1Hdiv",
            Self::H1H1 => "H1H1",
        }
    }

    /// Creates the heat flux space of this discretisation on the given mesh.
    pub fn create_flux_space<'a>(&self, mesh: &'a TriangleMesh2d) -> FluxSpace<'a> {
        match self {
            Self::H1Hdiv => Box::new(RaviartThomasSpace::new(mesh)),
            Self::H1H1 => Box::new(VectorLagrangeSpace::new(mesh)),
        }
    }
}

impl FromStr for DiscretisationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H1Hdiv" => Ok(Self::H1Hdiv),
            "H1H1" => Ok(Self::H1H1),
            _ => Err(ConfigError::UnknownDiscretisation(s.to_string())),
        }
    }
}

impl fmt::Display for DiscretisationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A heat flux space, chosen at runtime by the [`DiscretisationKind`].
pub type FluxSpace<'a> = Box<dyn VectorFiniteElementSpace + 'a>;

/// Which of the sub-matrices of a discretisation are up to date.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssemblyState {
    /// Nothing has been assembled yet.
    Uninitialized,
    /// Matrices that only depend on the meshes are valid, but the medium-dependent matrices are
    /// stale or missing.
    GeometryOnly,
    /// All sub-matrices are valid for the current problem.
    FullyAssembled,
}

/// Spatial block matrices over the levels of the spatial hierarchy.
///
/// Block `(m, n)` pairs test functions of level `m` with trial functions of level `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialMatrices {
    /// `(u, v)` on the temperature space.
    pub temperature_mass: BlockMatrix,
    /// `(Q ∇u, Q ∇v)` on the temperature space.
    pub temperature_stiffness: BlockMatrix,
    /// `(q, r)` on the heat flux space.
    pub flux_mass: BlockMatrix,
    /// `(div q, div r)` on the heat flux space.
    pub flux_div_div: BlockMatrix,
    /// `(Q ∇u, r)`, with heat flux test functions as rows and temperature trial functions as
    /// columns.
    pub gradient: BlockMatrix,
    /// `(div q, v)`, with temperature test functions as rows and heat flux trial functions as
    /// columns.
    pub divergence: BlockMatrix,
}

/// Temporal block matrices over the temporal levels.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalMatrices {
    pub mass: BlockMatrix,
    pub stiffness: BlockMatrix,
    /// Entries `∫ φ_j' φ_i dt`.
    pub gradient: BlockMatrix,
    /// Entries `φ_i(0) φ_j(0)`.
    pub initial: BlockMatrix,
}

impl TemporalMatrices {
    pub fn assemble(levels: &TemporalLevels) -> Self {
        Self {
            mass: assemble_mass_matrix(levels),
            stiffness: assemble_stiffness_matrix(levels),
            gradient: assemble_gradient_matrix(levels),
            initial: assemble_initial_matrix(levels),
        }
    }
}

/// The four space-time blocks of the least-squares system.
///
/// `block11` couples temperature with temperature, `block12` has temperature test functions and
/// heat flux trial functions, `block21` is its transpose and `block22` couples heat flux with
/// heat flux.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemBlocks {
    pub block11: BlockMatrix,
    pub block12: BlockMatrix,
    pub block21: BlockMatrix,
    pub block22: BlockMatrix,
}

impl SystemBlocks {
    /// Combines the blocks into the monolithic system matrix, without boundary conditions.
    pub fn to_monolithic(&self) -> CsrMatrix<f64> {
        let n_temperature = self.block11.nrows();
        let n_flux = self.block22.nrows();
        let sizes = [n_temperature, n_flux];
        BlockMatrix::from_blocks(
            &sizes,
            &sizes,
            vec![
                self.block11.to_monolithic(),
                self.block12.to_monolithic(),
                self.block21.to_monolithic(),
                self.block22.to_monolithic(),
            ],
        )
        .to_monolithic()
    }
}

/// Right-hand side of the least-squares system, split into temperature and heat flux parts.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemRhs {
    pub temperature: BlockVector,
    pub flux: BlockVector,
}

impl SystemRhs {
    pub fn to_monolithic(&self) -> DVector<f64> {
        let n_temperature = self.temperature.len();
        let mut rhs = DVector::zeros(n_temperature + self.flux.len());
        rhs.rows_mut(0, n_temperature)
            .copy_from(self.temperature.as_vector());
        rhs.rows_mut(n_temperature, self.flux.len())
            .copy_from(self.flux.as_vector());
        rhs
    }
}

/// Adds the time integrals of the source terms over the uniform intervals of one temporal basis
/// to the right-hand side blocks.
///
/// `basis` returns, for a time `t` in interval `p`, the indices of the temporal basis functions
/// that are non-zero on the interval together with their values and derivatives at `t`.
pub(crate) fn add_source_contributions<T, Q, B>(
    problem: &dyn HeatProblem,
    temperature_space: &T,
    flux_space: &Q,
    intervals: impl Iterator<Item = [f64; 2]>,
    basis: B,
    temperature_rhs: &mut DVector<f64>,
    flux_rhs: &mut DVector<f64>,
) -> eyre::Result<()>
where
    T: ?Sized + ScalarFiniteElementSpace,
    Q: ?Sized + VectorFiniteElementSpace,
    B: Fn(usize, f64) -> Vec<(usize, f64, f64)>,
{
    let quadrature = default_quadrature();
    let (time_weights, time_points) = gauss(3)?;
    let n_temperature = temperature_space.num_dofs();
    let n_flux = flux_space.num_dofs();
    for (p, [a, b]) in intervals.enumerate() {
        for (w, xi) in time_weights.iter().zip(&time_points) {
            let t = a + 0.5 * (xi.x + 1.0) * (b - a);
            let weight = 0.5 * (b - a) * w;
            let f = |x: &Point2<f64>| problem.source(x, t);
            let temperature_load = assemble_scalar_load_vector(temperature_space, &f, &quadrature);
            let flux_load = assemble_divergence_load_vector(flux_space, &f, &quadrature);
            for (j, phi, dphi) in basis(p, t) {
                temperature_rhs
                    .rows_mut(j * n_temperature, n_temperature)
                    .axpy(weight * dphi, &temperature_load, 1.0);
                flux_rhs
                    .rows_mut(j * n_flux, n_flux)
                    .axpy(-weight * phi, &flux_load, 1.0);
            }
        }
    }
    Ok(())
}

/// Space-time indices `offset + j * n_x + k` of all products of temporal functions
/// `0..num_temporal` with the essential spatial degrees of freedom `k`.
pub(crate) fn space_time_indices(offset: usize, num_temporal: usize, num_spatial: usize, spatial: &[usize]) -> Vec<usize> {
    (0..num_temporal)
        .flat_map(|j| spatial.iter().map(move |k| offset + j * num_spatial + k))
        .collect()
}

/// Sparse space-time least-squares discretisation over a nested spatial hierarchy and a
/// hierarchical temporal basis with the same number of levels.
#[derive(Debug)]
pub struct SparseHeatDiscretisation<'a> {
    kind: DiscretisationKind,
    temporal_levels: TemporalLevels,
    problem: &'a dyn HeatProblem,
    temperature: NestedFeHierarchy<'a, LagrangeSpace<'a>>,
    flux: NestedFeHierarchy<'a, FluxSpace<'a>>,
    essential_dofs: Vec<Vec<usize>>,
    assembler: BlockFormAssembler,
    spatial: Option<SpatialMatrices>,
    temporal: Option<TemporalMatrices>,
    state: AssemblyState,
}

impl<'a> SparseHeatDiscretisation<'a> {
    /// # Panics
    ///
    /// Panics if the temporal and spatial hierarchies have different numbers of levels.
    pub fn new(
        kind: DiscretisationKind,
        temporal_levels: TemporalLevels,
        mesh_hierarchy: &'a NestedMeshHierarchy,
        problem: &'a dyn HeatProblem,
    ) -> Self {
        assert_eq!(
            temporal_levels.num_levels(),
            mesh_hierarchy.num_levels(),
            "Temporal and spatial hierarchies must have the same number of levels"
        );
        let temperature = NestedFeHierarchy::lagrange(mesh_hierarchy);
        let flux = NestedFeHierarchy::from_fn(mesh_hierarchy, |mesh| kind.create_flux_space(mesh));
        let essential_dofs = temperature
            .spaces()
            .iter()
            .map(FiniteElementSpace::essential_dofs)
            .collect();
        Self {
            kind,
            temporal_levels,
            problem,
            temperature,
            flux,
            essential_dofs,
            assembler: BlockFormAssembler::default(),
            spatial: None,
            temporal: None,
            state: AssemblyState::Uninitialized,
        }
    }

    pub fn kind(&self) -> DiscretisationKind {
        self.kind
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    pub fn num_levels(&self) -> usize {
        self.temporal_levels.num_levels()
    }

    pub fn temporal_levels(&self) -> &TemporalLevels {
        &self.temporal_levels
    }

    pub fn problem(&self) -> &'a dyn HeatProblem {
        self.problem
    }

    pub fn temperature_hierarchy(&self) -> &NestedFeHierarchy<'a, LagrangeSpace<'a>> {
        &self.temperature
    }

    pub fn flux_hierarchy(&self) -> &NestedFeHierarchy<'a, FluxSpace<'a>> {
        &self.flux
    }

    /// Essential temperature degrees of freedom of each spatial level.
    pub fn essential_dofs(&self) -> &[Vec<usize>] {
        &self.essential_dofs
    }

    pub fn spatial_matrices(&self) -> Option<&SpatialMatrices> {
        self.spatial.as_ref()
    }

    pub fn temporal_matrices(&self) -> Option<&TemporalMatrices> {
        self.temporal.as_ref()
    }

    /// Replaces the problem.
    ///
    /// Matrices that depend on the medium of the problem become stale, while the remaining
    /// matrices stay valid.
    pub fn set_problem(&mut self, problem: &'a dyn HeatProblem) {
        self.problem = problem;
        if self.state == AssemblyState::FullyAssembled {
            self.state = AssemblyState::GeometryOnly;
        }
    }

    /// Spatial level paired with temporal level `i`.
    fn spatial_level(&self, i: usize) -> usize {
        self.num_levels() - 1 - i
    }

    /// Sizes of the temperature space-time blocks.
    pub fn temperature_block_sizes(&self) -> Vec<usize> {
        (0..self.num_levels())
            .map(|i| {
                self.temporal_levels.block_size(i)
                    * self
                        .temperature
                        .space(self.spatial_level(i))
                        .num_dofs()
            })
            .collect()
    }

    /// Sizes of the heat flux space-time blocks.
    pub fn flux_block_sizes(&self) -> Vec<usize> {
        (0..self.num_levels())
            .map(|i| self.temporal_levels.block_size(i) * self.flux.space(self.spatial_level(i)).num_dofs())
            .collect()
    }

    pub fn num_dofs(&self) -> usize {
        self.temperature_block_sizes().iter().sum::<usize>() + self.flux_block_sizes().iter().sum::<usize>()
    }

    fn assemble_medium_dependent(&self) -> eyre::Result<(BlockMatrix, BlockMatrix)> {
        let problem = self.problem;
        let medium = move |x: &Point2<f64>| problem.medium(x);
        let stiffness = self.assembler.assemble_bilinear_form(
            &SpatialStiffnessIntegrator::new().with_coefficient(medium),
            &self.temperature,
        )?;
        let gradient = self.assembler.assemble_mixed_bilinear_form(
            &VectorFeGradientIntegrator::new().with_coefficient(medium),
            &self.temperature,
            &self.flux,
        )?;
        Ok((stiffness, gradient))
    }

    /// Assembles all temporal and spatial sub-matrices from scratch.
    pub fn assemble_system_sub_matrices(&mut self) -> eyre::Result<AssemblyState> {
        info!(
            "Assembling sub-matrices of {} discretisation with {} levels",
            self.kind,
            self.num_levels()
        );
        let temporal = TemporalMatrices::assemble(&self.temporal_levels);
        let temperature_mass = self
            .assembler
            .assemble_bilinear_form(&SpatialMassIntegrator::new(), &self.temperature)?;
        let flux_mass = self
            .assembler
            .assemble_bilinear_form(&VectorFeMassIntegrator::new(), &self.flux)?;
        let flux_div_div = self
            .assembler
            .assemble_bilinear_form(&VectorFeStiffnessIntegrator::new(), &self.flux)?;
        let divergence = self.assembler.assemble_mixed_bilinear_form(
            &VectorFeDivergenceIntegrator::new(),
            &self.flux,
            &self.temperature,
        )?;
        let (temperature_stiffness, gradient) = self.assemble_medium_dependent()?;

        self.temporal = Some(temporal);
        self.spatial = Some(SpatialMatrices {
            temperature_mass,
            temperature_stiffness,
            flux_mass,
            flux_div_div,
            gradient,
            divergence,
        });
        self.state = AssemblyState::FullyAssembled;
        Ok(self.state)
    }

    /// Reassembles only the matrices that depend on the medium of the problem.
    ///
    /// Falls back to full assembly if nothing has been assembled yet.
    pub fn reassemble_medium_dependent(&mut self) -> eyre::Result<AssemblyState> {
        if self.state == AssemblyState::Uninitialized || self.spatial.is_none() {
            return self.assemble_system_sub_matrices();
        }
        debug!("Reassembling medium-dependent matrices for problem {}", self.problem.name());
        let (temperature_stiffness, gradient) = self.assemble_medium_dependent()?;
        if let Some(spatial) = self.spatial.as_mut() {
            spatial.temperature_stiffness = temperature_stiffness;
            spatial.gradient = gradient;
        }
        self.state = AssemblyState::FullyAssembled;
        Ok(self.state)
    }

    fn assembled_matrices(&self) -> eyre::Result<(&SpatialMatrices, &TemporalMatrices)> {
        match (self.state, &self.spatial, &self.temporal) {
            (AssemblyState::FullyAssembled, Some(spatial), Some(temporal)) => Ok((spatial, temporal)),
            (state, _, _) => Err(eyre!("sub-matrices are not fully assembled (state: {:?})", state)),
        }
    }

    /// Builds the space-time blocks as sums of Kronecker products of temporal and spatial blocks.
    pub fn build_system_blocks(&self) -> eyre::Result<SystemBlocks> {
        let (spatial, temporal) = self.assembled_matrices()?;
        let temperature_sizes = self.temperature_block_sizes();
        let flux_sizes = self.flux_block_sizes();
        let mut block11 = BlockMatrix::zeros(&temperature_sizes, &temperature_sizes);
        let mut block12 = BlockMatrix::zeros(&temperature_sizes, &flux_sizes);
        let mut block22 = BlockMatrix::zeros(&flux_sizes, &flux_sizes);

        for i in 0..self.num_levels() {
            for j in 0..self.num_levels() {
                let (ii, jj) = (self.spatial_level(i), self.spatial_level(j));
                let mass_t = temporal.mass.block(i, j);

                let initial_plus_stiffness_t = add(temporal.initial.block(i, j), temporal.stiffness.block(i, j));
                let b11 = add(
                    &kronecker_product(&initial_plus_stiffness_t, spatial.temperature_mass.block(ii, jj)),
                    &kronecker_product(mass_t, spatial.temperature_stiffness.block(ii, jj)),
                );
                block11.set_block(i, j, b11);

                let gradient_t = temporal.gradient.block(j, i).transpose();
                let gradient_x = spatial.gradient.block(jj, ii).transpose();
                let b12 = add_scaled(
                    -1.0,
                    &kronecker_product(&gradient_t, spatial.divergence.block(ii, jj)),
                    -1.0,
                    &kronecker_product(mass_t, &gradient_x),
                );
                block12.set_block(i, j, b12);

                let flux_x = add(spatial.flux_mass.block(ii, jj), spatial.flux_div_div.block(ii, jj));
                block22.set_block(i, j, kronecker_product(mass_t, &flux_x));
            }
        }

        let block21 = block12.transpose();
        Ok(SystemBlocks {
            block11,
            block12,
            block21,
            block22,
        })
    }

    /// Indices of the temperature unknowns subject to homogeneous Dirichlet conditions, in the
    /// numbering of the monolithic system.
    pub fn essential_space_time_dofs(&self) -> Vec<usize> {
        let offsets = offsets_from_sizes(&self.temperature_block_sizes());
        (0..self.num_levels())
            .flat_map(|i| {
                let level = self.spatial_level(i);
                space_time_indices(
                    offsets[i],
                    self.temporal_levels.block_size(i),
                    self.temperature.space(level).num_dofs(),
                    &self.essential_dofs[level],
                )
            })
            .collect()
    }

    /// Builds the monolithic system matrix with boundary conditions applied.
    pub fn build_system_matrix(&self, blocks: &SystemBlocks) -> CsrMatrix<f64> {
        let matrix = blocks.to_monolithic();
        let essential = self.essential_space_time_dofs();
        debug!(
            "Eliminating {} essential unknowns from system with {} unknowns",
            essential.len(),
            matrix.nrows()
        );
        eliminate_rows_and_cols(&matrix, &essential)
    }

    /// Assembles the right-hand side, with essential entries set to zero.
    pub fn assemble_rhs(&self) -> eyre::Result<SystemRhs> {
        let mut temperature_rhs = BlockVector::zeros(&self.temperature_block_sizes());
        let mut flux_rhs = BlockVector::zeros(&self.flux_block_sizes());

        let levels = &self.temporal_levels;
        let mut temperature_block = DVector::zeros(0);
        let mut flux_block = DVector::zeros(0);
        for i in 0..self.num_levels() {
            let level = self.spatial_level(i);
            temperature_block.resize_vertically_mut(temperature_rhs.block(i).len(), 0.0);
            flux_block.resize_vertically_mut(flux_rhs.block(i).len(), 0.0);
            temperature_block.fill(0.0);
            flux_block.fill(0.0);

            add_source_contributions(
                self.problem,
                self.temperature.space(level),
                self.flux.space(level),
                (0..levels.num_intervals(i)).map(|p| levels.interval(i, p)),
                |p, t| {
                    levels
                        .interval_functions(i, p)
                        .into_iter()
                        .map(|j| {
                            let (phi, dphi) = levels.evaluate(i, j, t);
                            (j, phi, dphi)
                        })
                        .collect()
                },
                &mut temperature_block,
                &mut flux_block,
            )?;
            temperature_rhs.block_mut(i).copy_from(&temperature_block);
            flux_rhs.block_mut(i).copy_from(&flux_block);
        }

        // Only the first nodal function of the coarsest temporal level is non-zero at t = 0
        let finest = self.temperature.finest_space();
        let initial = assemble_scalar_load_vector(
            finest,
            |x: &Point2<f64>| self.problem.initial_temperature(x),
            &default_quadrature(),
        );
        temperature_rhs
            .block_mut(0)
            .rows_mut(0, initial.len())
            .axpy(1.0, &initial, 1.0);

        zero_entries(temperature_rhs.as_vector_mut(), &self.essential_space_time_dofs());
        Ok(SystemRhs {
            temperature: temperature_rhs,
            flux: flux_rhs,
        })
    }

    /// Extracts temperature and heat flux at the initial and end time from a solution vector.
    pub fn solution_handler(&self) -> SolutionHandler {
        let finest = self.num_levels() - 1;
        SolutionHandler::new(
            self.temperature_block_sizes().iter().sum(),
            self.flux_block_sizes().iter().sum(),
            self.temporal_levels.block_size(0),
            self.temperature.space(finest).num_dofs(),
            self.flux.space(finest).num_dofs(),
        )
    }
}
