//! Nested mesh and finite element space hierarchies.
//!
//! A hierarchy is an ordered sequence of meshes (levels `0..L`, coarsest to finest) in which every
//! element of a finer mesh is geometrically contained in exactly one element of each coarser
//! mesh. The parent-children relationship between levels is discovered by locating the centroids
//! of the fine elements in the coarse mesh.
use crate::locate::PointLocator;
use crate::mesh::refinement::refine_uniformly_repeatedly;
use crate::mesh::TriangleMesh2d;
use eyre::{eyre, WrapErr};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

mod fe;
mod table;

pub use fe::*;
pub use table::*;

#[derive(Debug)]
pub struct NestedMeshHierarchy {
    meshes: Vec<TriangleMesh2d>,
    // tables[i] maps elements of level i to their children at level i + 1
    tables: Vec<ParentChildrenTable>,
    composed_tables: RefCell<FxHashMap<(usize, usize), Rc<ParentChildrenTable>>>,
}

impl NestedMeshHierarchy {
    /// Builds the hierarchy from a sequence of nested meshes, ordered from coarsest to finest.
    ///
    /// # Panics
    ///
    /// Panics if `meshes` is empty or if the number of elements decreases from one level to the
    /// next.
    pub fn build(meshes: Vec<TriangleMesh2d>) -> eyre::Result<Self> {
        assert!(!meshes.is_empty(), "A hierarchy needs at least one mesh");
        for (level, pair) in meshes.windows(2).enumerate() {
            assert!(
                pair[0].num_elements() <= pair[1].num_elements(),
                "Mesh at level {} has more elements than the mesh at level {}",
                level,
                level + 1
            );
        }

        let tables = meshes
            .windows(2)
            .enumerate()
            .map(|(level, pair)| {
                locate_children(&pair[0], &pair[1])
                    .wrap_err_with(|| format!("failed to build parent-children table for levels ({}, {})", level, level + 1))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        log::debug!(
            "Built nested mesh hierarchy with element counts {:?}",
            meshes.iter().map(TriangleMesh2d::num_elements).collect::<Vec<_>>()
        );

        Ok(Self {
            meshes,
            tables,
            composed_tables: RefCell::new(FxHashMap::default()),
        })
    }

    /// Builds a hierarchy with `num_levels` levels by uniformly refining the given coarse mesh.
    pub fn from_uniform_refinement(coarse: TriangleMesh2d, num_levels: usize) -> eyre::Result<Self> {
        assert!(num_levels > 0, "A hierarchy needs at least one level");
        Self::build(refine_uniformly_repeatedly(coarse, num_levels - 1))
    }

    pub fn num_levels(&self) -> usize {
        self.meshes.len()
    }

    pub fn meshes(&self) -> &[TriangleMesh2d] {
        &self.meshes
    }

    pub fn mesh(&self, level: usize) -> &TriangleMesh2d {
        &self.meshes[level]
    }

    pub fn finest_mesh(&self) -> &TriangleMesh2d {
        self.meshes.last().expect("Hierarchy is never empty")
    }

    /// Parent-children tables between consecutive levels.
    pub fn tables(&self) -> &[ParentChildrenTable] {
        &self.tables
    }

    /// The parent-children table mapping elements of `coarse_level` to their descendants at
    /// `fine_level`.
    ///
    /// Tables between non-adjacent levels are composed from the single-step tables and memoized,
    /// so repeated queries for the same pair are cheap.
    ///
    /// # Panics
    ///
    /// Panics unless `coarse_level < fine_level < num_levels()`.
    pub fn multi_level_table(&self, coarse_level: usize, fine_level: usize) -> Rc<ParentChildrenTable> {
        assert!(coarse_level < fine_level, "Coarse level must be strictly coarser than fine level");
        assert!(fine_level < self.num_levels(), "Fine level out of bounds");

        if let Some(table) = self.composed_tables.borrow().get(&(coarse_level, fine_level)) {
            return Rc::clone(table);
        }

        let table = if fine_level == coarse_level + 1 {
            self.tables[coarse_level].clone()
        } else {
            let remainder = self.multi_level_table(coarse_level + 1, fine_level);
            self.tables[coarse_level].compose(&remainder)
        };
        let table = Rc::new(table);
        self.composed_tables
            .borrow_mut()
            .insert((coarse_level, fine_level), Rc::clone(&table));
        table
    }

    /// Builds the table between two levels by locating the fine element centroids directly in the
    /// coarse mesh, without going through intermediate levels.
    pub fn build_direct_table(&self, coarse_level: usize, fine_level: usize) -> eyre::Result<ParentChildrenTable> {
        assert!(coarse_level < fine_level, "Coarse level must be strictly coarser than fine level");
        locate_children(&self.meshes[coarse_level], &self.meshes[fine_level])
    }
}

/// Locates the centroid of every element of `fine` in `coarse`.
fn locate_children(coarse: &TriangleMesh2d, fine: &TriangleMesh2d) -> eyre::Result<ParentChildrenTable> {
    if coarse.num_elements() == 0 {
        return if fine.num_elements() == 0 {
            Ok(ParentChildrenTable::new(0))
        } else {
            Err(eyre!("cannot locate fine elements in an empty coarse mesh"))
        };
    }

    let locator = PointLocator::new(coarse);
    let centroids: Vec<_> = (0..fine.num_elements())
        .map(|e| fine.element_centroid(e))
        .collect();
    let located = locator.locate_points(&centroids, 0)?;

    let mut table = ParentChildrenTable::new(coarse.num_elements());
    for (child, (parent, _)) in located.into_iter().enumerate() {
        table.insert(parent, child);
    }
    Ok(table)
}
