//! Composition graph for products
//!
//! Products contain other products as ingredients. The graph refuses any
//! ingredient that would make a product part of itself, and does so without
//! walking the graph: every product caches its full ancestor set, so the
//! cycle check is one set lookup. The price is memory plus an ancestor-set
//! merge on each accepted ingredient.
//!
//! The index only ever grows. There is no way to remove an ingredient.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use tracing::{debug, trace};

use super::name::ProductName;
use super::product::{Product, ProductId};
use crate::config::GraphConfig;

static NEXT_GRAPH_TAG: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Product {0} does not belong to this graph")]
    InvalidArgument(ProductId),

    #[error("Ingredient rejected: {0} -> {1}")]
    IngredientRejected(ProductName, ProductName),

    #[error("Ancestor index is stale for product: {0}")]
    StaleAncestorIndex(ProductName),
}

/// Why an ingredient was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    SelfContainment,
    Cycle,
    TooDeep,
}

impl Rejection {
    fn as_str(&self) -> &'static str {
        match self {
            Rejection::SelfContainment => "self_containment",
            Rejection::Cycle => "cycle",
            Rejection::TooDeep => "max_depth",
        }
    }
}

/// A growth-only DAG of products
///
/// Edges point from a product to its ingredients. Products are interned by
/// name: there is exactly one node per name.
#[derive(Debug)]
pub struct CompositionGraph {
    /// Tag stamped into every handle this graph issues
    tag: u32,

    /// The underlying directed graph
    graph: DiGraph<Product, ()>,

    /// Map from product name to node index
    node_map: HashMap<ProductName, NodeIndex>,

    config: GraphConfig,
}

impl Default for CompositionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionGraph {
    /// Creates an empty graph with default configuration
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Creates an empty graph tuned by `config`
    pub fn with_config(config: GraphConfig) -> Self {
        let capacity = config.initial_capacity;
        Self {
            tag: NEXT_GRAPH_TAG.fetch_add(1, Ordering::Relaxed),
            graph: DiGraph::with_capacity(capacity, capacity),
            node_map: HashMap::with_capacity(capacity),
            config,
        }
    }

    /// Builds a graph from `(product, ingredients)` pairs
    ///
    /// Fails on the first ingredient the graph refuses.
    pub fn from_recipes<I, P, C>(recipes: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self::from_recipes_with_config(GraphConfig::default(), recipes)
    }

    /// Same as [`from_recipes`](Self::from_recipes), on a graph tuned by `config`
    pub fn from_recipes_with_config<I, P, C>(
        config: GraphConfig,
        recipes: I,
    ) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut graph = Self::with_config(config);

        for (product, ingredients) in recipes {
            let parent = graph.add_product(ProductName::new(product.as_ref()));
            for ingredient in ingredients {
                let child = graph.add_product(ProductName::new(ingredient.as_ref()));
                if !graph.add_child(parent, child)? {
                    return Err(GraphError::IngredientRejected(
                        graph.graph[parent.index].name().clone(),
                        graph.graph[child.index].name().clone(),
                    ));
                }
            }
        }

        Ok(graph)
    }

    /// Returns the configuration the graph was built with
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Adds a product to the graph, returning the existing handle when a
    /// product with this name is already present
    pub fn add_product(&mut self, name: ProductName) -> ProductId {
        if let Some(&idx) = self.node_map.get(&name) {
            return self.id(idx);
        }

        let idx = self.graph.add_node(Product::new(name.clone()));
        trace!(product = %name, "product created");
        self.node_map.insert(name, idx);
        self.id(idx)
    }

    /// Adds `child` as an ingredient of `parent`
    ///
    /// Returns `Ok(false)` without touching the graph when the ingredient is
    /// `parent` itself, already contains `parent`, or would exceed the
    /// configured depth. Adding an ingredient that is already present is
    /// accepted and changes nothing.
    pub fn add_child(&mut self, parent: ProductId, child: ProductId) -> Result<bool, GraphError> {
        let parent_idx = self.resolve(parent)?;
        let child_idx = self.resolve(child)?;

        if let Some(rejection) = self.rejection(parent_idx, child_idx) {
            debug!(
                parent = %self.graph[parent_idx].name(),
                child = %self.graph[child_idx].name(),
                reason = rejection.as_str(),
                "ingredient rejected"
            );
            return Ok(false);
        }

        self.graph.update_edge(parent_idx, child_idx, ());

        let mut inherited = self.graph[parent_idx].ancestors().clone();
        inherited.insert(self.id(parent_idx));
        let updated = self.propagate(child_idx, &inherited);

        debug!(
            parent = %self.graph[parent_idx].name(),
            child = %self.graph[child_idx].name(),
            updated,
            "ingredient added"
        );

        if self.config.verify_index {
            self.verify_ancestor_index()?;
        }

        Ok(true)
    }

    /// Looks both products up by name (creating them if needed) and adds the
    /// ingredient
    pub fn add_child_by_name(&mut self, parent: &str, child: &str) -> Result<bool, GraphError> {
        let parent = self.add_product(ProductName::new(parent));
        let child = self.add_product(ProductName::new(child));
        self.add_child(parent, child)
    }

    /// Returns whether [`add_child`](Self::add_child) would accept the pair
    pub fn can_add(&self, parent: ProductId, child: ProductId) -> Result<bool, GraphError> {
        let parent_idx = self.resolve(parent)?;
        let child_idx = self.resolve(child)?;
        Ok(self.rejection(parent_idx, child_idx).is_none())
    }

    fn rejection(&self, parent: NodeIndex, child: NodeIndex) -> Option<Rejection> {
        if parent == child {
            return Some(Rejection::SelfContainment);
        }

        if self.graph[parent].has_ancestor(self.id(child)) {
            return Some(Rejection::Cycle);
        }

        if let Some(max_depth) = self.config.max_depth {
            let chain = self.longest_path(parent, Direction::Incoming)
                + 1
                + self.longest_path(child, Direction::Outgoing);
            if chain > max_depth {
                return Some(Rejection::TooDeep);
            }
        }

        None
    }

    /// Merges `inherited` into the ancestors of `start` and everything below
    /// it. Returns the number of products whose ancestor set grew.
    ///
    /// A product that already holds every inherited ancestor is skipped
    /// together with its ingredients: their ancestor sets are supersets of
    /// its own.
    fn propagate(&mut self, start: NodeIndex, inherited: &HashSet<ProductId>) -> usize {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        let mut updated = 0;

        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            if !self.graph[idx].inherit(inherited) {
                continue;
            }
            updated += 1;
            stack.extend(self.graph.neighbors_directed(idx, Direction::Outgoing));
        }

        trace!(updated, "ancestor sets propagated");
        updated
    }

    /// Number of edges on the longest path leaving `start` in `direction`
    fn longest_path(&self, start: NodeIndex, direction: Direction) -> usize {
        let mut lengths: HashMap<NodeIndex, usize> = HashMap::new();
        let mut stack = vec![(start, false)];

        while let Some((idx, expanded)) = stack.pop() {
            if lengths.contains_key(&idx) {
                continue;
            }

            if expanded {
                let length = self
                    .graph
                    .neighbors_directed(idx, direction)
                    .map(|next| lengths.get(&next).copied().unwrap_or(0) + 1)
                    .max()
                    .unwrap_or(0);
                lengths.insert(idx, length);
            } else {
                stack.push((idx, true));
                stack.extend(
                    self.graph
                        .neighbors_directed(idx, direction)
                        .filter(|next| !lengths.contains_key(next))
                        .map(|next| (next, false)),
                );
            }
        }

        lengths.get(&start).copied().unwrap_or(0)
    }

    /// Recomputes every ancestor set by walking the graph and compares it
    /// against the cached index
    pub fn verify_ancestor_index(&self) -> Result<(), GraphError> {
        for idx in self.graph.node_indices() {
            let mut reachable = self.walk(idx, Direction::Incoming);
            reachable.remove(&self.id(idx));

            if &reachable != self.graph[idx].ancestors() {
                return Err(GraphError::StaleAncestorIndex(
                    self.graph[idx].name().clone(),
                ));
            }
        }
        Ok(())
    }

    /// Breadth-first walk from `start`, including `start` itself
    fn walk(&self, start: NodeIndex, direction: Direction) -> HashSet<ProductId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(idx) = queue.pop_front() {
            if visited.insert(self.id(idx)) {
                queue.extend(self.graph.neighbors_directed(idx, direction));
            }
        }
        visited
    }

    fn id(&self, idx: NodeIndex) -> ProductId {
        ProductId::new(self.tag, idx)
    }

    fn resolve(&self, id: ProductId) -> Result<NodeIndex, GraphError> {
        if id.graph != self.tag || id.index() >= self.graph.node_count() {
            return Err(GraphError::InvalidArgument(id));
        }
        Ok(id.index)
    }

    pub fn get(&self, id: ProductId) -> Result<&Product, GraphError> {
        let idx = self.resolve(id)?;
        Ok(&self.graph[idx])
    }

    pub fn name(&self, id: ProductId) -> Result<&ProductName, GraphError> {
        Ok(self.get(id)?.name())
    }

    /// Returns the handle of the product with the given name, if present
    pub fn find(&self, name: &str) -> Option<ProductId> {
        self.node_map.get(name).map(|&idx| self.id(idx))
    }

    /// Returns the direct ingredients of a product
    pub fn children(&self, id: ProductId) -> Result<HashSet<ProductId>, GraphError> {
        let idx = self.resolve(id)?;
        Ok(self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| self.id(child))
            .collect())
    }

    /// Returns every product that contains this one, directly or transitively
    pub fn ancestors(&self, id: ProductId) -> Result<&HashSet<ProductId>, GraphError> {
        Ok(self.get(id)?.ancestors())
    }

    /// Returns true if `ancestor` contains `product`, directly or transitively
    pub fn is_ancestor(&self, ancestor: ProductId, product: ProductId) -> Result<bool, GraphError> {
        self.resolve(ancestor)?;
        Ok(self.get(product)?.has_ancestor(ancestor))
    }

    /// Returns every ingredient of a product, directly or transitively
    ///
    /// Not cached; walks the graph.
    pub fn descendants(&self, id: ProductId) -> Result<HashSet<ProductId>, GraphError> {
        let idx = self.resolve(id)?;
        let mut descendants = self.walk(idx, Direction::Outgoing);
        descendants.remove(&id);
        Ok(descendants)
    }

    /// Length of the longest ingredient chain from any root down to `id`
    pub fn depth(&self, id: ProductId) -> Result<usize, GraphError> {
        let idx = self.resolve(id)?;
        Ok(self.longest_path(idx, Direction::Incoming))
    }

    /// Products that are not an ingredient of anything
    pub fn roots(&self) -> Vec<ProductId> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].is_root())
            .map(|idx| self.id(idx))
            .collect()
    }

    /// Products without ingredients
    pub fn leaves(&self) -> Vec<ProductId> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.id(idx))
            .collect()
    }

    /// Returns all products with every product ahead of its ingredients
    pub fn topological_order(&self) -> Result<Vec<ProductId>, GraphError> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|idx| self.id(idx)).collect()),
            // Only reachable if the ancestor index failed to block a cycle
            Err(cycle) => Err(GraphError::StaleAncestorIndex(
                self.graph[cycle.node_id()].name().clone(),
            )),
        }
    }

    /// Returns true if the graph contains a product with this name
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Returns the number of products in the graph
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of ingredient edges in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph has no products
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns all product handles in creation order
    pub fn products(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.graph.node_indices().map(|idx| self.id(idx))
    }
}
