//! Graph structure and node management.
//!
//! The RenderGraph holds every node an engine knows about and the edges
//! between them. Nodes are stored in an IndexMap so iteration follows
//! insertion order and render passes are deterministic.

use crate::core::error::{ConnectionId, GraphError, GraphResult, NodeId};
use crate::core::types::Frame;
use crate::engine::{SharedSink, SharedUnit};
use crate::graph::connection::{Connection, Endpoint};
use image::RgbaImage;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// What a node does when a frame reaches it.
#[derive(Clone)]
pub enum NodeRole {
    /// Static image; emits the same pixels on every trigger.
    Source(Arc<RgbaImage>),
    /// Processing unit.
    Unit(SharedUnit),
    /// Terminal surface.
    Sink(SharedSink),
}

impl NodeRole {
    fn describe(&self) -> &'static str {
        match self {
            NodeRole::Source(_) => "source",
            NodeRole::Unit(_) => "unit",
            NodeRole::Sink(_) => "sink",
        }
    }
}

/// A node instance in the graph.
#[derive(Clone)]
pub struct GraphNode {
    /// Unique identifier
    pub id: NodeId,
    /// Label used in diagnostics
    pub label: String,
    /// Behavior of the node
    pub role: NodeRole,
    /// Number of input slots, fixed when the node is added
    pub inputs: usize,
    /// Most recent frame this node emitted
    pub last_output: Option<Frame>,
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("role", &self.role.describe())
            .field("inputs", &self.inputs)
            .field("has_output", &self.last_output.is_some())
            .finish()
    }
}

impl GraphNode {
    /// Create a node, reading the input arity from its role.
    pub fn new(label: impl Into<String>, role: NodeRole) -> Self {
        let inputs = match &role {
            NodeRole::Source(_) => 0,
            NodeRole::Unit(unit) => unit.lock().inputs(),
            NodeRole::Sink(_) => 1,
        };
        Self {
            id: NodeId::new(),
            label: label.into(),
            role,
            inputs,
            last_output: None,
        }
    }

    /// Whether this node produces frames other nodes can consume.
    pub fn emits(&self) -> bool {
        !matches!(self.role, NodeRole::Sink(_))
    }
}

/// The engine's node and edge storage.
#[derive(Debug, Clone, Default)]
pub struct RenderGraph {
    nodes: IndexMap<NodeId, GraphNode>,
    connections: Vec<Connection>,
}

impl RenderGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node Management
    // ========================================================================

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node. Fails while the node still has connections.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<GraphNode> {
        if !self.has_node(id) {
            return Err(GraphError::NodeNotFound(id));
        }
        if self.connections.iter().any(|c| c.touches(id)) {
            return Err(GraphError::NodeHasConnections(id));
        }
        self.nodes
            .shift_remove(&id)
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Get a reference to a node.
    pub fn get_node(&self, id: NodeId) -> GraphResult<&GraphNode> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Get a mutable reference to a node.
    pub fn get_node_mut(&mut self, id: NodeId) -> GraphResult<&mut GraphNode> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Check if a node exists.
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Get all node IDs in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Connection Management
    // ========================================================================

    /// Connect `from`'s output into the lowest free input slot of `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> GraphResult<ConnectionId> {
        let to_node = self.get_node(to)?;
        let inputs = to_node.inputs;
        let slot = (0..inputs)
            .find(|&slot| !self.is_input_connected(to, slot))
            .ok_or(GraphError::NoFreeInput { node_id: to, inputs })?;
        self.connect_at(from, to, slot)
    }

    /// Connect `from`'s output into a specific input slot of `to`.
    pub fn connect_at(&mut self, from: NodeId, to: NodeId, slot: usize) -> GraphResult<ConnectionId> {
        let from_node = self.get_node(from)?;
        let to_node = self.get_node(to)?;

        if !from_node.emits() {
            return Err(GraphError::InvalidConnection {
                reason: format!("sink '{}' has no output", from_node.label),
            });
        }

        if slot >= to_node.inputs {
            return Err(GraphError::InvalidConnection {
                reason: format!(
                    "'{}' takes {} input(s), slot {} requested",
                    to_node.label, to_node.inputs, slot
                ),
            });
        }

        if self.is_input_connected(to, slot) {
            return Err(GraphError::SlotAlreadyConnected { node_id: to, slot });
        }

        if self.is_reachable(to, from) {
            return Err(GraphError::CycleDetected {
                nodes: vec![from, to],
            });
        }

        let connection = Connection::new(from, Endpoint::new(to, slot));
        let id = connection.id;
        self.connections.push(connection);
        Ok(id)
    }

    /// Remove a connection by ID.
    pub fn disconnect(&mut self, id: ConnectionId) -> GraphResult<Connection> {
        let pos = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or(GraphError::ConnectionNotFound(id))?;

        Ok(self.connections.remove(pos))
    }

    /// Remove every connection into or out of a node.
    ///
    /// Returns the number of connections removed.
    pub fn disconnect_all(&mut self, node_id: NodeId) -> GraphResult<usize> {
        if !self.has_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        let before = self.connections.len();
        self.connections.retain(|conn| !conn.touches(node_id));
        Ok(before - self.connections.len())
    }

    /// Get all connections.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Get all connections leaving a node.
    pub fn connections_from(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from == node_id)
    }

    /// Get all connections entering a node.
    pub fn connections_to(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.to.node_id == node_id)
    }

    /// The connection feeding a specific input slot, if any.
    pub fn connection_into(&self, node_id: NodeId, slot: usize) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.to.node_id == node_id && c.to.slot == slot)
    }

    /// Check if an input slot is already connected.
    pub fn is_input_connected(&self, node_id: NodeId, slot: usize) -> bool {
        self.connection_into(node_id, slot).is_some()
    }

    /// Get the number of connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ========================================================================
    // Graph Analysis
    // ========================================================================

    /// Check if `target` is reachable from `start` following connections.
    pub fn is_reachable(&self, start: NodeId, target: NodeId) -> bool {
        if start == target {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }

            if visited.insert(current) {
                for conn in self.connections_from(current) {
                    queue.push_back(conn.to.node_id);
                }
            }
        }

        false
    }

    /// Get all nodes reachable from the given node (excluding itself).
    pub fn get_downstream(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        for conn in self.connections_from(node_id) {
            queue.push_back(conn.to.node_id);
        }

        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                result.push(current);
                for conn in self.connections_from(current) {
                    queue.push_back(conn.to.node_id);
                }
            }
        }

        result
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::RenderView;
    use crate::operations::blend::{Blend, BlendMode};
    use crate::operations::color::ColorInversion;
    use parking_lot::Mutex;

    fn source() -> GraphNode {
        GraphNode::new("source", NodeRole::Source(Arc::new(RgbaImage::new(2, 2))))
    }

    fn unit() -> GraphNode {
        GraphNode::new("invert", NodeRole::Unit(Arc::new(Mutex::new(ColorInversion))))
    }

    fn blend() -> GraphNode {
        GraphNode::new(
            "blend",
            NodeRole::Unit(Arc::new(Mutex::new(Blend::new(BlendMode::Alpha)))),
        )
    }

    fn sink() -> GraphNode {
        GraphNode::new("view", NodeRole::Sink(Arc::new(Mutex::new(RenderView::new()))))
    }

    #[test]
    fn test_arity_from_role() {
        assert_eq!(source().inputs, 0);
        assert_eq!(unit().inputs, 1);
        assert_eq!(blend().inputs, 2);
        assert_eq!(sink().inputs, 1);
    }

    #[test]
    fn test_connect_fills_slots_in_order() {
        let mut graph = RenderGraph::new();
        let a = graph.add_node(source());
        let b = graph.add_node(source());
        let mix = graph.add_node(blend());

        graph.connect(a, mix).unwrap();
        graph.connect(b, mix).unwrap();

        assert_eq!(graph.connection_into(mix, 0).unwrap().from, a);
        assert_eq!(graph.connection_into(mix, 1).unwrap().from, b);

        let c = graph.add_node(source());
        let result = graph.connect(c, mix);
        assert!(matches!(result, Err(GraphError::NoFreeInput { inputs: 2, .. })));
    }

    #[test]
    fn test_sink_has_no_output() {
        let mut graph = RenderGraph::new();
        let view = graph.add_node(sink());
        let invert = graph.add_node(unit());
        let result = graph.connect(view, invert);
        assert!(matches!(result, Err(GraphError::InvalidConnection { .. })));
    }

    #[test]
    fn test_source_has_no_input() {
        let mut graph = RenderGraph::new();
        let a = graph.add_node(source());
        let b = graph.add_node(source());
        assert!(matches!(graph.connect(a, b), Err(GraphError::NoFreeInput { .. })));
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = RenderGraph::new();
        let first = graph.add_node(unit());
        let second = graph.add_node(unit());

        graph.connect(first, second).unwrap();
        let result = graph.connect(second, first);
        assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
    }

    #[test]
    fn test_remove_requires_disconnect() {
        let mut graph = RenderGraph::new();
        let src = graph.add_node(source());
        let invert = graph.add_node(unit());
        let view = graph.add_node(sink());
        graph.connect(src, invert).unwrap();
        graph.connect(invert, view).unwrap();

        assert!(matches!(
            graph.remove_node(src),
            Err(GraphError::NodeHasConnections(_))
        ));

        assert_eq!(graph.disconnect_all(invert).unwrap(), 2);
        assert_eq!(graph.connection_count(), 0);
        graph.remove_node(src).unwrap();
        graph.remove_node(invert).unwrap();
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_downstream() {
        let mut graph = RenderGraph::new();
        let src = graph.add_node(source());
        let invert = graph.add_node(unit());
        let view = graph.add_node(sink());
        graph.connect(src, invert).unwrap();
        graph.connect(invert, view).unwrap();

        let downstream = graph.get_downstream(src);
        assert_eq!(downstream, vec![invert, view]);
        assert!(graph.is_reachable(src, view));
        assert!(!graph.is_reachable(view, src));
    }
}
