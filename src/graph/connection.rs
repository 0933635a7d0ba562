//! Connection types for the render graph.

use crate::core::error::{ConnectionId, NodeId};
use serde::{Deserialize, Serialize};

/// The receiving end of a connection (node + input slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// The node ID.
    pub node_id: NodeId,
    /// Input slot on that node, filled in connection order.
    pub slot: usize,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(node_id: NodeId, slot: usize) -> Self {
        Self { node_id, slot }
    }
}

/// A directed edge carrying frames from one node's output into another's input.
///
/// Nodes have a single output, so only the receiving side needs a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier for this connection.
    pub id: ConnectionId,
    /// Node whose output feeds the edge.
    pub from: NodeId,
    /// Input receiving the frames.
    pub to: Endpoint,
}

impl Connection {
    /// Create a new connection.
    pub fn new(from: NodeId, to: Endpoint) -> Self {
        Self {
            id: ConnectionId::new(),
            from,
            to,
        }
    }

    /// Whether this edge touches the given node at either end.
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.from == node_id || self.to.node_id == node_id
    }
}
