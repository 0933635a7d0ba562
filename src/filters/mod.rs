//! Filter catalog.
//!
//! Descriptors say how to build, wire and drive one filter. The catalog
//! groups them by category; `builtin` holds the bundled entries.

pub mod builtin;
pub mod catalog;
pub mod descriptor;

pub use builtin::build_catalog;
pub use catalog::{
    CatalogBuilder, CatalogContext, CatalogReport, DescriptorSummary, FilterCatalog,
};
pub use descriptor::{DescriptorBuilder, FilterDescriptor, DEFAULT_RANGE};
