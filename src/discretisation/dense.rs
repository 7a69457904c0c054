//! Full tensor-product discretisation on a single spatial mesh and a uniform temporal mesh.
//!
//! This uses the standard nodal basis in time, assembled element by element with quadrature,
//! and serves as a reference for the sparse discretisation: with a single level both produce
//! the same system.
use crate::assembly::global::BlockFormAssembler;
use crate::assembly::local::{
    default_quadrature, SpatialMassIntegrator, SpatialStiffnessIntegrator, VectorFeDivergenceIntegrator,
    VectorFeGradientIntegrator, VectorFeMassIntegrator, VectorFeStiffnessIntegrator,
};
use crate::assembly::source::assemble_scalar_load_vector;
use crate::block::{BlockMatrix, BlockVector};
use crate::discretisation::{
    add_source_contributions, space_time_indices, DiscretisationKind, FluxSpace, SystemBlocks, SystemRhs,
    TemporalMatrices,
};
use crate::element::Segment1dElement;
use crate::mesh::TriangleMesh2d;
use crate::problem::HeatProblem;
use crate::quadrature::univariate::gauss;
use crate::solution::SolutionHandler;
use crate::space::{FiniteElementSpace, LagrangeSpace};
use nalgebra::{DVector, Point2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use sparse_heat_linalg::ops::{add, add_scaled, eliminate_rows_and_cols, kronecker_product, zero_entries};

#[derive(Debug)]
pub struct DenseHeatDiscretisation<'a> {
    kind: DiscretisationKind,
    end_time: f64,
    temporal_level: u32,
    problem: &'a dyn HeatProblem,
    temperature_space: LagrangeSpace<'a>,
    flux_space: FluxSpace<'a>,
    assembler: BlockFormAssembler,
}

impl<'a> DenseHeatDiscretisation<'a> {
    /// Creates a discretisation with `2^temporal_level` uniform intervals on `[0, end_time]`.
    pub fn new(
        kind: DiscretisationKind,
        end_time: f64,
        temporal_level: u32,
        mesh: &'a TriangleMesh2d,
        problem: &'a dyn HeatProblem,
    ) -> Self {
        assert!(end_time > 0.0, "End time must be positive");
        Self {
            kind,
            end_time,
            temporal_level,
            problem,
            temperature_space: LagrangeSpace::new(mesh),
            flux_space: kind.create_flux_space(mesh),
            assembler: BlockFormAssembler::default(),
        }
    }

    pub fn kind(&self) -> DiscretisationKind {
        self.kind
    }

    pub fn num_time_intervals(&self) -> usize {
        1 << self.temporal_level
    }

    pub fn num_time_nodes(&self) -> usize {
        self.num_time_intervals() + 1
    }

    fn time_intervals(&self) -> impl Iterator<Item = Segment1dElement> {
        let h = self.end_time / self.num_time_intervals() as f64;
        (0..self.num_time_intervals()).map(move |p| Segment1dElement::from_endpoints(p as f64 * h, (p + 1) as f64 * h))
    }

    pub fn num_temperature_dofs(&self) -> usize {
        self.num_time_nodes() * self.temperature_space.num_dofs()
    }

    pub fn num_flux_dofs(&self) -> usize {
        self.num_time_nodes() * self.flux_space.num_dofs()
    }

    /// Assembles the temporal matrices of the nodal basis, each as a single block.
    pub fn assemble_temporal_matrices(&self) -> eyre::Result<TemporalMatrices> {
        let n = self.num_time_nodes();
        let (weights, points) = gauss(2)?;
        let mut mass = CooMatrix::new(n, n);
        let mut stiffness = CooMatrix::new(n, n);
        let mut gradient = CooMatrix::new(n, n);
        for (p, segment) in self.time_intervals().enumerate() {
            let dofs = [p, p + 1];
            let dphi = segment.physical_derivatives();
            let jacobian = segment.reference_jacobian();
            for (w, xi) in weights.iter().zip(&points) {
                let phi = segment.evaluate_basis(xi.x);
                let weight = w * jacobian;
                for a in 0..2 {
                    for b in 0..2 {
                        mass.push(dofs[a], dofs[b], weight * phi[a] * phi[b]);
                        stiffness.push(dofs[a], dofs[b], weight * dphi[a] * dphi[b]);
                        gradient.push(dofs[a], dofs[b], weight * dphi[b] * phi[a]);
                    }
                }
            }
        }
        let mut initial = CooMatrix::new(n, n);
        initial.push(0, 0, 1.0);

        let single_block = |coo: &CooMatrix<f64>| BlockMatrix::from_blocks(&[n], &[n], vec![CsrMatrix::from(coo)]);
        Ok(TemporalMatrices {
            mass: single_block(&mass),
            stiffness: single_block(&stiffness),
            gradient: single_block(&gradient),
            initial: single_block(&initial),
        })
    }

    /// Builds the space-time system blocks, each consisting of a single block.
    pub fn build_system_blocks(&self) -> eyre::Result<SystemBlocks> {
        let temporal = self.assemble_temporal_matrices()?;
        let (mass_t, stiffness_t) = (temporal.mass.block(0, 0), temporal.stiffness.block(0, 0));
        let (gradient_t, initial_t) = (temporal.gradient.block(0, 0), temporal.initial.block(0, 0));

        let problem = self.problem;
        let medium = move |x: &Point2<f64>| problem.medium(x);
        let temperature = &self.temperature_space;
        let flux = &self.flux_space;
        let assembler = &self.assembler;
        let mass_x1 = assembler.assemble_same_level(&SpatialMassIntegrator::new(), temperature)?;
        let stiffness_x1 = assembler.assemble_same_level(
            &SpatialStiffnessIntegrator::new().with_coefficient(medium),
            temperature,
        )?;
        let mass_x2 = assembler.assemble_same_level(&VectorFeMassIntegrator::new(), flux)?;
        let div_div_x2 = assembler.assemble_same_level(&VectorFeStiffnessIntegrator::new(), flux)?;
        let gradient_x =
            assembler.assemble_same_level_mixed(&VectorFeGradientIntegrator::new().with_coefficient(medium), temperature, flux)?;
        let divergence_x = assembler.assemble_same_level_mixed(&VectorFeDivergenceIntegrator::new(), flux, temperature)?;

        let block11 = add(
            &kronecker_product(&add(initial_t, stiffness_t), &mass_x1),
            &kronecker_product(mass_t, &stiffness_x1),
        );
        let block12 = add_scaled(
            -1.0,
            &kronecker_product(&gradient_t.transpose(), &divergence_x),
            -1.0,
            &kronecker_product(mass_t, &gradient_x.transpose()),
        );
        let block22 = kronecker_product(mass_t, &add(&mass_x2, &div_div_x2));

        let n_temperature = [self.num_temperature_dofs()];
        let n_flux = [self.num_flux_dofs()];
        let block12 = BlockMatrix::from_blocks(&n_temperature, &n_flux, vec![block12]);
        Ok(SystemBlocks {
            block11: BlockMatrix::from_blocks(&n_temperature, &n_temperature, vec![block11]),
            block21: block12.transpose(),
            block12,
            block22: BlockMatrix::from_blocks(&n_flux, &n_flux, vec![block22]),
        })
    }

    pub fn essential_space_time_dofs(&self) -> Vec<usize> {
        space_time_indices(
            0,
            self.num_time_nodes(),
            self.temperature_space.num_dofs(),
            &self.temperature_space.essential_dofs(),
        )
    }

    pub fn build_system_matrix(&self, blocks: &SystemBlocks) -> CsrMatrix<f64> {
        eliminate_rows_and_cols(&blocks.to_monolithic(), &self.essential_space_time_dofs())
    }

    pub fn assemble_rhs(&self) -> eyre::Result<SystemRhs> {
        let mut temperature_rhs = DVector::zeros(self.num_temperature_dofs());
        let mut flux_rhs = DVector::zeros(self.num_flux_dofs());
        let segments: Vec<_> = self.time_intervals().collect();
        add_source_contributions(
            self.problem,
            &self.temperature_space,
            &self.flux_space,
            segments.iter().map(|segment| *segment.endpoints()),
            |p, t| {
                let segment = &segments[p];
                let [a, _] = *segment.endpoints();
                let xi = (t - a) / segment.reference_jacobian() - 1.0;
                let phi = segment.evaluate_basis(xi);
                let dphi = segment.physical_derivatives();
                vec![(p, phi[0], dphi[0]), (p + 1, phi[1], dphi[1])]
            },
            &mut temperature_rhs,
            &mut flux_rhs,
        )?;

        let initial = assemble_scalar_load_vector(
            &self.temperature_space,
            |x: &Point2<f64>| self.problem.initial_temperature(x),
            &default_quadrature(),
        );
        temperature_rhs
            .rows_mut(0, initial.len())
            .axpy(1.0, &initial, 1.0);
        zero_entries(&mut temperature_rhs, &self.essential_space_time_dofs());

        Ok(SystemRhs {
            temperature: BlockVector::from_vector(&[self.num_temperature_dofs()], temperature_rhs),
            flux: BlockVector::from_vector(&[self.num_flux_dofs()], flux_rhs),
        })
    }

    pub fn solution_handler(&self) -> SolutionHandler {
        SolutionHandler::new(
            self.num_temperature_dofs(),
            self.num_flux_dofs(),
            self.num_time_nodes(),
            self.temperature_space.num_dofs(),
            self.flux_space.num_dofs(),
        )
    }
}
