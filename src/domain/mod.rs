//! Domain models for recipe-dag
//!
//! Contains the product graph and its identity types, without any I/O.

mod graph;
mod name;
mod product;

pub use graph::{CompositionGraph, GraphError};
pub use name::ProductName;
pub use product::{Product, ProductId};
