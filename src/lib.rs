//! recipe-dag - composite products that can never contain themselves
//!
//! Products (recipes, assemblies, bills of materials) contain other products
//! as ingredients. A [`CompositionGraph`] keeps, for every product, the set of
//! all products that contain it, so refusing an ingredient that would close
//! a cycle is a single lookup rather than a graph walk.
//!
//! ```
//! use recipe_dag::CompositionGraph;
//!
//! let mut graph = CompositionGraph::new();
//! assert!(graph.add_child_by_name("Burger", "Patty")?);
//! assert!(!graph.add_child_by_name("Patty", "Burger")?);
//! # Ok::<(), recipe_dag::GraphError>(())
//! ```

pub mod config;
pub mod domain;

pub use config::{ConfigError, GraphConfig};
pub use domain::{CompositionGraph, GraphError, Product, ProductId, ProductName};
