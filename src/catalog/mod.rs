//! Catalog: declared index schemas

pub mod registry;

pub use registry::IndexRegistry;
