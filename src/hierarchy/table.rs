use std::collections::BTreeSet;

/// Maps every element of a coarse mesh to the set of its descendants in a finer nested mesh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParentChildrenTable {
    children: Vec<BTreeSet<usize>>,
}

impl ParentChildrenTable {
    /// Creates a table with the given number of parents, none of which have children.
    pub fn new(num_parents: usize) -> Self {
        Self {
            children: vec![BTreeSet::new(); num_parents],
        }
    }

    pub fn from_children(children: Vec<BTreeSet<usize>>) -> Self {
        Self { children }
    }

    pub fn insert(&mut self, parent: usize, child: usize) {
        self.children[parent].insert(child);
    }

    pub fn num_parents(&self) -> usize {
        self.children.len()
    }

    /// Total number of (parent, child) pairs.
    pub fn num_children(&self) -> usize {
        self.children.iter().map(BTreeSet::len).sum()
    }

    pub fn children(&self, parent: usize) -> &BTreeSet<usize> {
        &self.children[parent]
    }

    /// Iterates over `(parent, child)` pairs in increasing order.
    pub fn iter(&self) -> impl '_ + Iterator<Item = (usize, usize)> {
        self.children
            .iter()
            .enumerate()
            .flat_map(|(parent, children)| children.iter().map(move |&child| (parent, child)))
    }

    /// Composes two tables end-to-end.
    ///
    /// Given `self` mapping level `n` to level `m` and `other` mapping level `m` to level `k`, the
    /// result maps level `n` to level `k`.
    pub fn compose(&self, other: &ParentChildrenTable) -> ParentChildrenTable {
        let children = self
            .children
            .iter()
            .map(|intermediate| {
                intermediate
                    .iter()
                    .flat_map(|&c| other.children(c).iter().copied())
                    .collect()
            })
            .collect();
        Self { children }
    }

    /// Composes a chain of single-step tables `(0, 1), (1, 2), ..., (k - 1, k)` into the direct
    /// table `(0, k)`.
    ///
    /// # Panics
    ///
    /// Panics if the chain is empty.
    pub fn compose_multi_level(tables: &[ParentChildrenTable]) -> ParentChildrenTable {
        match tables {
            [] => panic!("Cannot compose an empty chain of tables"),
            [table] => table.clone(),
            [first, rest @ ..] => {
                let children = first
                    .children
                    .iter()
                    .map(|intermediate| {
                        intermediate
                            .iter()
                            .flat_map(|&c| descendants(c, rest))
                            .collect()
                    })
                    .collect();
                Self { children }
            }
        }
    }
}

/// Descendants of `element` at the end of the chain.
fn descendants(element: usize, tables: &[ParentChildrenTable]) -> BTreeSet<usize> {
    match tables {
        [] => BTreeSet::from([element]),
        [first, rest @ ..] => first
            .children(element)
            .iter()
            .flat_map(|&c| descendants(c, rest))
            .collect(),
    }
}
