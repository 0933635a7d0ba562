//! Render graph storage used by the software engine.
//!
//! A render graph is a directed acyclic graph where nodes are sources,
//! processing units or sinks and edges carry frames between them.

pub mod connection;
pub mod structure;
pub mod topology;

// Re-export commonly used types
pub use connection::{Connection, Endpoint};
pub use structure::{GraphNode, NodeRole, RenderGraph};
pub use topology::TopologyAnalyzer;
