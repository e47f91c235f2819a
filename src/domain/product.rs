//! Product nodes
//!
//! A [`Product`] lives inside a [`CompositionGraph`](super::CompositionGraph)
//! and is referred to by a copyable [`ProductId`] handle. Besides its name,
//! each product caches the set of every product that contains it, directly
//! or through other ingredients. The graph keeps that set exact after every
//! mutation, so "is X an ancestor of Y" is a single lookup.

use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::name::ProductName;

/// Handle to a product owned by a specific graph
///
/// Handles carry the tag of the graph that issued them, so a handle from one
/// graph is never mistaken for a node of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId {
    pub(crate) graph: u32,
    pub(crate) index: NodeIndex,
}

impl ProductId {
    pub(crate) fn new(graph: u32, index: NodeIndex) -> Self {
        Self { graph, index }
    }

    /// Position of the product within its graph
    pub fn index(&self) -> usize {
        self.index.index()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}@g{}", self.index.index(), self.graph)
    }
}

/// A composable item
///
/// Equality and hashing look at the name only, so sets and maps of products
/// are keyed by name regardless of where the products sit in a graph.
#[derive(Debug, Clone)]
pub struct Product {
    name: ProductName,
    ancestors: HashSet<ProductId>,
}

impl Product {
    pub(crate) fn new(name: ProductName) -> Self {
        Self {
            name,
            ancestors: HashSet::new(),
        }
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    /// Every product that contains this one, directly or transitively
    pub fn ancestors(&self) -> &HashSet<ProductId> {
        &self.ancestors
    }

    pub fn has_ancestor(&self, id: ProductId) -> bool {
        self.ancestors.contains(&id)
    }

    /// Returns true until the product is used as an ingredient somewhere
    pub fn is_root(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// Merges `inherited` into the ancestor set.
    ///
    /// Returns false when every inherited ancestor was already present.
    pub(crate) fn inherit(&mut self, inherited: &HashSet<ProductId>) -> bool {
        if inherited.is_subset(&self.ancestors) {
            return false;
        }
        self.ancestors.extend(inherited.iter().copied());
        true
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Product {}

impl Hash for Product {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str) -> Product {
        Product::new(ProductName::new(name))
    }

    fn id(index: u32) -> ProductId {
        ProductId::new(0, NodeIndex::new(index as usize))
    }

    #[test]
    fn new_product_is_root() {
        let bun = product("Bun");
        assert!(bun.is_root());
        assert!(bun.ancestors().is_empty());
        assert_eq!(bun.name().as_str(), "Bun");
    }

    #[test]
    fn equality_ignores_ancestors() {
        let plain = product("Bun");
        let mut inherited = product("Bun");
        inherited.inherit(&HashSet::from([id(1), id(2)]));

        assert_eq!(plain, inherited);

        let set: HashSet<Product> = [plain, inherited].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn inherit_grows_monotonically() {
        let mut patty = product("Patty");

        assert!(patty.inherit(&HashSet::from([id(1)])));
        assert!(patty.inherit(&HashSet::from([id(1), id(2)])));
        assert!(!patty.inherit(&HashSet::from([id(2)])));
        assert!(!patty.inherit(&HashSet::new()));

        assert!(!patty.is_root());
        assert!(patty.has_ancestor(id(1)));
        assert!(patty.has_ancestor(id(2)));
        assert_eq!(patty.ancestors().len(), 2);
    }

    #[test]
    fn id_display() {
        assert_eq!(ProductId::new(3, NodeIndex::new(7)).to_string(), "p7@g3");
    }
}
