//! Product names
//!
//! A product is identified by its name and nothing else: two products with
//! the same name are the same product, wherever they sit in a graph. The
//! name is opaque. It is stored exactly as given, so `" Bun"` and `"Bun"`
//! are different products, and the empty string is a valid name.

use std::borrow::Borrow;
use std::fmt;

/// Identity key of a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductName(String);

impl ProductName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<ProductName> for String {
    fn from(name: ProductName) -> Self {
        name.0
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets the graph look products up by `&str` without allocating.
impl Borrow<str> for ProductName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
