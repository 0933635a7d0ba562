//! Error types for Chitra.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Name the descriptor or node they concern
//! - Separate recoverable conditions (missing assets, engine failures) from
//!   programmer errors (descriptor contract violations)
//! - Convert into the top-level [`ChitraError`] with `?`

use crate::core::types::FilterKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a node in an engine graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Unique identifier for a connection in an engine graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for Chitra.
#[derive(Error, Debug)]
pub enum ChitraError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while building catalog descriptors.
///
/// Every variant names the offending descriptor so the diagnostic can be
/// traced back to one catalog entry.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogError {
    #[error("Descriptor '{descriptor}' skipped: asset '{asset}' is missing")]
    AssetMissing { descriptor: String, asset: String },

    #[error("Descriptor '{descriptor}' skipped: asset '{asset}' is unusable: {reason}")]
    InvalidAsset {
        descriptor: String,
        asset: String,
        reason: String,
    },

    #[error("Descriptor '{descriptor}' has kind Custom but no custom wiring")]
    MissingCustomWiring { descriptor: String },

    #[error("Descriptor '{descriptor}' has kind {kind} but supplies custom wiring")]
    UnexpectedCustomWiring { descriptor: String, kind: FilterKind },

    #[error("Descriptor '{descriptor}' has invalid range (min {min}, max {max}, default {default})")]
    InvalidRange {
        descriptor: String,
        min: f32,
        max: f32,
        default: f32,
    },

    #[error("Descriptor '{descriptor}' has kind {kind} but its unit takes {inputs} input(s)")]
    KindMismatch {
        descriptor: String,
        kind: FilterKind,
        inputs: usize,
    },

    #[error("Descriptor '{descriptor}' is already registered in category '{category}'")]
    DuplicateName { category: String, descriptor: String },
}

impl CatalogError {
    /// Name of the descriptor this error concerns.
    pub fn descriptor(&self) -> &str {
        match self {
            CatalogError::AssetMissing { descriptor, .. }
            | CatalogError::InvalidAsset { descriptor, .. }
            | CatalogError::MissingCustomWiring { descriptor }
            | CatalogError::UnexpectedCustomWiring { descriptor, .. }
            | CatalogError::InvalidRange { descriptor, .. }
            | CatalogError::KindMismatch { descriptor, .. }
            | CatalogError::DuplicateName { descriptor, .. } => descriptor,
        }
    }

    /// Whether this is a programmer error in the descriptor itself, as opposed
    /// to a missing bundled asset.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(
            self,
            CatalogError::AssetMissing { .. } | CatalogError::InvalidAsset { .. }
        )
    }
}

/// Errors related to graph structure and operations.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    #[error("Node {node_id} has no free input (takes {inputs})")]
    NoFreeInput { node_id: NodeId, inputs: usize },

    #[error("Input {slot} on node {node_id} is already connected")]
    SlotAlreadyConnected { node_id: NodeId, slot: usize },

    #[error("Invalid connection: {reason}")]
    InvalidConnection { reason: String },

    #[error("Cycle detected in graph involving nodes: {nodes:?}")]
    CycleDetected { nodes: Vec<NodeId> },

    #[error("Cannot release node {0}: it has active connections")]
    NodeHasConnections(NodeId),
}

/// Error raised inside a single processing unit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("{operation} expects {expected} input frame(s), got {got}")]
    InputCount {
        operation: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{operation}: {reason}")]
    Failed {
        operation: &'static str,
        reason: String,
    },
}

/// Errors reported by an image engine while processing.
///
/// These are non-fatal for the display surface: it shows a fallback state and
/// can still tear the pipeline down.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Processing failed at node {node_id} ({label}): {reason}")]
    ProcessingFailed {
        node_id: NodeId,
        label: String,
        reason: String,
    },

    #[error("Frame budget exhausted at node {node_id} ({label}): {required} pixels > {limit}")]
    ResourceExhausted {
        node_id: NodeId,
        label: String,
        required: u64,
        limit: u64,
    },

    #[error("Node {node_id} ({label}) has inputs and cannot be triggered directly")]
    NotTriggerable { node_id: NodeId, label: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors from the bundled asset library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Asset '{0}' not found")]
    NotFound(String),

    #[error("Asset '{name}' could not be decoded: {reason}")]
    Decode { name: String, reason: String },
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors from the display surface and parameter controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("No pipeline is wired")]
    NotWired,

    #[error("A pipeline is already wired for '{0}'")]
    AlreadyWired(String),

    #[error("Pipeline for '{0}' has been torn down")]
    TornDown(String),

    #[error("Wiring '{descriptor}' failed: {source}")]
    Wiring {
        descriptor: String,
        #[source]
        source: EngineError,
    },

    #[error("Processing '{descriptor}' failed: {source}")]
    Processing {
        descriptor: String,
        #[source]
        source: EngineError,
    },
}

/// Result type alias for Chitra operations.
pub type ChitraResult<T> = Result<T, ChitraError>;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
