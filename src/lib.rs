//! # step-finder
//!
//! Search a hierarchical STEP product catalog (XML) for products whose
//! attribute matches a field/value pair.
//!
//! ## Architecture
//!
//! - **model**: Product, attribute and catalog types, shared by XML and JSON
//! - **decode**: Streaming `quick-xml` decoder producing the nested product tree
//! - **progress**: Byte-offset progress observers for long decodes
//! - **flatten**: Nested tree to flat catalog with parent links
//! - **search**: Field/value matcher and catalog search
//! - **cache**: JSON snapshot of a parsed catalog
//! - **catalog**: Snapshot-or-parse loading
//! - **emit**: Per-match JSON artifacts
//! - **cli** / **config**: Command line surface and path resolution

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod decode;
pub mod emit;
pub mod error;
pub mod flatten;
pub mod model;
pub mod progress;
pub mod search;

#[cfg(test)]
mod test_support;

pub use error::{CatalogError, Result};
pub use model::{AttributeGroup, AttributeValue, Catalog, CatalogStats, CrossReference, Product};
pub use search::{Query, SearchScope};
