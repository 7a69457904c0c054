use crate::hierarchy::{NestedMeshHierarchy, ParentChildrenTable};
use crate::mesh::TriangleMesh2d;
use crate::space::{FiniteElementSpace, LagrangeSpace, RaviartThomasSpace, VectorLagrangeSpace};
use std::rc::Rc;

/// One finite element space per level of a nested mesh hierarchy.
#[derive(Debug)]
pub struct NestedFeHierarchy<'a, Space> {
    mesh_hierarchy: &'a NestedMeshHierarchy,
    spaces: Vec<Space>,
}

impl<'a, Space> NestedFeHierarchy<'a, Space>
where
    Space: FiniteElementSpace,
{
    /// Creates a space on every level of the mesh hierarchy with the given constructor.
    pub fn from_fn(mesh_hierarchy: &'a NestedMeshHierarchy, create_space: impl Fn(&'a TriangleMesh2d) -> Space) -> Self {
        let spaces = mesh_hierarchy.meshes().iter().map(create_space).collect();
        Self { mesh_hierarchy, spaces }
    }

    pub fn mesh_hierarchy(&self) -> &'a NestedMeshHierarchy {
        self.mesh_hierarchy
    }

    pub fn num_levels(&self) -> usize {
        self.spaces.len()
    }

    pub fn space(&self, level: usize) -> &Space {
        &self.spaces[level]
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn finest_space(&self) -> &Space {
        self.spaces.last().expect("Hierarchy is never empty")
    }

    /// Number of degrees of freedom of each level.
    pub fn num_dofs(&self) -> Vec<usize> {
        self.spaces.iter().map(FiniteElementSpace::num_dofs).collect()
    }

    /// See [`NestedMeshHierarchy::multi_level_table`].
    pub fn multi_level_table(&self, coarse_level: usize, fine_level: usize) -> Rc<ParentChildrenTable> {
        self.mesh_hierarchy
            .multi_level_table(coarse_level, fine_level)
    }
}

impl<'a> NestedFeHierarchy<'a, LagrangeSpace<'a>> {
    pub fn lagrange(mesh_hierarchy: &'a NestedMeshHierarchy) -> Self {
        Self::from_fn(mesh_hierarchy, LagrangeSpace::new)
    }
}

impl<'a> NestedFeHierarchy<'a, RaviartThomasSpace<'a>> {
    pub fn raviart_thomas(mesh_hierarchy: &'a NestedMeshHierarchy) -> Self {
        Self::from_fn(mesh_hierarchy, RaviartThomasSpace::new)
    }
}

impl<'a> NestedFeHierarchy<'a, VectorLagrangeSpace<'a>> {
    pub fn vector_lagrange(mesh_hierarchy: &'a NestedMeshHierarchy) -> Self {
        Self::from_fn(mesh_hierarchy, VectorLagrangeSpace::new)
    }
}
