use crate::assembly::local::{BlockBilinearFormIntegrator, BlockMixedBilinearFormIntegrator};
use crate::block::BlockMatrix;
use crate::hierarchy::NestedFeHierarchy;
use crate::space::FiniteElementSpace;
use nalgebra::{DMatrix, DMatrixViewMut};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::cell::RefCell;

/// An assembler for block matrices over nested finite element hierarchies.
///
/// Block `(m, n)` of an assembled matrix pairs test functions of level `m` with trial functions of
/// level `n`. Same-level blocks are assembled element by element, and cross-level blocks by
/// iterating over every coarse element and each of its fine descendants.
#[derive(Debug, Clone, Default)]
pub struct BlockFormAssembler {
    // Buffers that prevent unnecessary allocations when assembling several matrices
    workspace: RefCell<AssemblerWorkspace>,
}

#[derive(Debug, Clone)]
struct AssemblerWorkspace {
    test_dofs: Vec<usize>,
    trial_dofs: Vec<usize>,
    element_matrix: DMatrix<f64>,
}

impl Default for AssemblerWorkspace {
    fn default() -> Self {
        Self {
            test_dofs: Vec::new(),
            trial_dofs: Vec::new(),
            element_matrix: DMatrix::zeros(0, 0),
        }
    }
}

impl AssemblerWorkspace {
    /// Prepares the buffers for an element pair and returns the local matrix view to assemble into.
    fn prepare<Test, Trial>(
        &mut self,
        test_space: &Test,
        test_element: usize,
        trial_space: &Trial,
        trial_element: usize,
    ) -> DMatrixViewMut<'_, f64>
    where
        Test: ?Sized + FiniteElementSpace,
        Trial: ?Sized + FiniteElementSpace,
    {
        let n_test = test_space.element_dof_count();
        let n_trial = trial_space.element_dof_count();
        self.test_dofs.resize(n_test, usize::MAX);
        self.trial_dofs.resize(n_trial, usize::MAX);
        test_space.populate_element_dofs(test_element, &mut self.test_dofs);
        trial_space.populate_element_dofs(trial_element, &mut self.trial_dofs);
        if self.element_matrix.shape() != (n_test, n_trial) {
            self.element_matrix = DMatrix::zeros(n_test, n_trial);
        }
        self.element_matrix.view_mut((0, 0), (n_test, n_trial))
    }

    fn scatter(&self, coo: &mut CooMatrix<f64>) {
        for (i, &row) in self.test_dofs.iter().enumerate() {
            for (j, &col) in self.trial_dofs.iter().enumerate() {
                let value = self.element_matrix[(i, j)];
                if value != 0.0 {
                    coo.push(row, col, value);
                }
            }
        }
    }
}

impl BlockFormAssembler {
    /// Assembles a symmetric form on a single space.
    pub fn assemble_same_level<S, I>(&self, integrator: &I, space: &S) -> eyre::Result<CsrMatrix<f64>>
    where
        S: ?Sized + FiniteElementSpace,
        I: ?Sized + BlockBilinearFormIntegrator<S>,
    {
        let ws = &mut *self.workspace.borrow_mut();
        let mut coo = CooMatrix::new(space.num_dofs(), space.num_dofs());
        for element_index in 0..space.num_elements() {
            let output = ws.prepare(space, element_index, space, element_index);
            integrator.assemble_same_level(space, element_index, output)?;
            ws.scatter(&mut coo);
        }
        Ok(CsrMatrix::from(&coo))
    }

    /// Assembles a mixed form with trial and test spaces on the same mesh.
    pub fn assemble_same_level_mixed<Trial, Test, I>(
        &self,
        integrator: &I,
        trial_space: &Trial,
        test_space: &Test,
    ) -> eyre::Result<CsrMatrix<f64>>
    where
        Trial: ?Sized + FiniteElementSpace,
        Test: ?Sized + FiniteElementSpace,
        I: ?Sized + BlockMixedBilinearFormIntegrator<Trial, Test>,
    {
        assert_eq!(
            trial_space.num_elements(),
            test_space.num_elements(),
            "Trial and test spaces must be defined on the same mesh"
        );
        let ws = &mut *self.workspace.borrow_mut();
        let mut coo = CooMatrix::new(test_space.num_dofs(), trial_space.num_dofs());
        for element_index in 0..test_space.num_elements() {
            let output = ws.prepare(test_space, element_index, trial_space, element_index);
            integrator.assemble_same_level(trial_space, test_space, element_index, output)?;
            ws.scatter(&mut coo);
        }
        Ok(CsrMatrix::from(&coo))
    }

    /// Assembles the same-level (diagonal) blocks of a symmetric form.
    pub fn assemble_diagonal_blocks<S, I>(
        &self,
        integrator: &I,
        hierarchy: &NestedFeHierarchy<S>,
    ) -> eyre::Result<Vec<CsrMatrix<f64>>>
    where
        S: FiniteElementSpace,
        I: ?Sized + BlockBilinearFormIntegrator<S>,
    {
        hierarchy
            .spaces()
            .iter()
            .map(|space| self.assemble_same_level(integrator, space))
            .collect()
    }

    /// Assembles block `(fine_level, coarse_level)` of a symmetric form.
    pub fn assemble_cross_level_block<S, I>(
        &self,
        integrator: &I,
        hierarchy: &NestedFeHierarchy<S>,
        fine_level: usize,
        coarse_level: usize,
    ) -> eyre::Result<CsrMatrix<f64>>
    where
        S: FiniteElementSpace,
        I: ?Sized + BlockBilinearFormIntegrator<S>,
    {
        let fine_space = hierarchy.space(fine_level);
        let coarse_space = hierarchy.space(coarse_level);
        let table = hierarchy.multi_level_table(coarse_level, fine_level);

        let ws = &mut *self.workspace.borrow_mut();
        let mut coo = CooMatrix::new(fine_space.num_dofs(), coarse_space.num_dofs());
        for (coarse_element, fine_element) in table.iter() {
            let output = ws.prepare(fine_space, fine_element, coarse_space, coarse_element);
            integrator.assemble_cross_level(fine_space, fine_element, coarse_space, coarse_element, output)?;
            ws.scatter(&mut coo);
        }
        Ok(CsrMatrix::from(&coo))
    }

    /// Assembles all blocks of a symmetric form over a hierarchy.
    ///
    /// Blocks below the diagonal are assembled from fine test elements and coarse trial elements,
    /// and the blocks above the diagonal are their transposes.
    pub fn assemble_bilinear_form<S, I>(&self, integrator: &I, hierarchy: &NestedFeHierarchy<S>) -> eyre::Result<BlockMatrix>
    where
        S: FiniteElementSpace,
        I: ?Sized + BlockBilinearFormIntegrator<S>,
    {
        let sizes = hierarchy.num_dofs();
        let mut matrix = BlockMatrix::zeros(&sizes, &sizes);
        for (level, block) in self
            .assemble_diagonal_blocks(integrator, hierarchy)?
            .into_iter()
            .enumerate()
        {
            matrix.set_block(level, level, block);
        }

        for m in 1..hierarchy.num_levels() {
            for n in (0..m).rev() {
                let block = self.assemble_cross_level_block(integrator, hierarchy, m, n)?;
                matrix.set_block(n, m, block.transpose());
                matrix.set_block(m, n, block);
            }
        }
        Ok(matrix)
    }

    /// Assembles all blocks of a mixed form over a pair of hierarchies on the same meshes.
    ///
    /// # Panics
    ///
    /// Panics if the hierarchies are not defined on the same mesh hierarchy.
    pub fn assemble_mixed_bilinear_form<Trial, Test, I>(
        &self,
        integrator: &I,
        trial_hierarchy: &NestedFeHierarchy<Trial>,
        test_hierarchy: &NestedFeHierarchy<Test>,
    ) -> eyre::Result<BlockMatrix>
    where
        Trial: FiniteElementSpace,
        Test: FiniteElementSpace,
        I: ?Sized + BlockMixedBilinearFormIntegrator<Trial, Test>,
    {
        assert_eq!(
            trial_hierarchy.num_levels(),
            test_hierarchy.num_levels(),
            "Trial and test hierarchies must have the same number of levels"
        );
        assert!(
            std::ptr::eq(trial_hierarchy.mesh_hierarchy(), test_hierarchy.mesh_hierarchy()),
            "Trial and test hierarchies must share the mesh hierarchy"
        );

        let num_levels = test_hierarchy.num_levels();
        let mut matrix = BlockMatrix::zeros(&test_hierarchy.num_dofs(), &trial_hierarchy.num_dofs());
        for level in 0..num_levels {
            let block = self.assemble_same_level_mixed(integrator, trial_hierarchy.space(level), test_hierarchy.space(level))?;
            matrix.set_block(level, level, block);
        }

        for m in 1..num_levels {
            for n in (0..m).rev() {
                let table = test_hierarchy.multi_level_table(n, m);
                let ws = &mut *self.workspace.borrow_mut();

                // Lower block: fine test (level m) against coarse trial (level n)
                let fine_test = test_hierarchy.space(m);
                let coarse_trial = trial_hierarchy.space(n);
                let mut lower = CooMatrix::new(fine_test.num_dofs(), coarse_trial.num_dofs());
                for (coarse_element, fine_element) in table.iter() {
                    let output = ws.prepare(fine_test, fine_element, coarse_trial, coarse_element);
                    integrator.assemble_cross_level(fine_test, fine_element, coarse_trial, coarse_element, output)?;
                    ws.scatter(&mut lower);
                }

                // Upper block: coarse test (level n) against fine trial (level m)
                let coarse_test = test_hierarchy.space(n);
                let fine_trial = trial_hierarchy.space(m);
                let mut upper = CooMatrix::new(coarse_test.num_dofs(), fine_trial.num_dofs());
                for (coarse_element, fine_element) in table.iter() {
                    let output = ws.prepare(coarse_test, coarse_element, fine_trial, fine_element);
                    integrator.assemble_cross_level_reversed(coarse_test, coarse_element, fine_trial, fine_element, output)?;
                    ws.scatter(&mut upper);
                }

                matrix.set_block(m, n, CsrMatrix::from(&lower));
                matrix.set_block(n, m, CsrMatrix::from(&upper));
            }
        }
        Ok(matrix)
    }
}
