//! Topological analysis of render graphs.
//!
//! Provides:
//! - Full topological sort (Kahn's algorithm)
//! - The ordered downstream set of one trigger root

use crate::core::error::{GraphError, GraphResult, NodeId};
use crate::graph::structure::RenderGraph;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Analyzer for graph topology.
pub struct TopologyAnalyzer<'a> {
    graph: &'a RenderGraph,
}

impl<'a> TopologyAnalyzer<'a> {
    /// Create a new analyzer for the given graph.
    pub fn new(graph: &'a RenderGraph) -> Self {
        Self { graph }
    }

    /// Topological order of every node in the graph.
    ///
    /// Ties are broken by node insertion order, so the result is stable.
    pub fn topological_sort(&self) -> GraphResult<Vec<NodeId>> {
        let all: IndexSet<NodeId> = self.graph.node_ids().collect();
        self.sort_subset(&all)
    }

    /// The trigger root followed by everything reachable from it, in an order
    /// where each node comes after all of its reachable upstreams.
    pub fn downstream_order(&self, root: NodeId) -> GraphResult<Vec<NodeId>> {
        if !self.graph.has_node(root) {
            return Err(GraphError::NodeNotFound(root));
        }

        let mut reachable: IndexSet<NodeId> = IndexSet::new();
        reachable.insert(root);
        reachable.extend(self.graph.get_downstream(root));

        // Keep insertion order inside the subset so ties resolve the same way
        // on every pass.
        let ordered: IndexSet<NodeId> = self
            .graph
            .node_ids()
            .filter(|id| reachable.contains(id))
            .collect();

        self.sort_subset(&ordered)
    }

    fn sort_subset(&self, subset: &IndexSet<NodeId>) -> GraphResult<Vec<NodeId>> {
        let mut in_degree: IndexMap<NodeId, usize> =
            subset.iter().map(|&id| (id, 0)).collect();

        for conn in self.graph.connections() {
            if subset.contains(&conn.from) {
                if let Some(degree) = in_degree.get_mut(&conn.to.node_id) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut result = Vec::with_capacity(subset.len());

        while let Some(node) = queue.pop_front() {
            result.push(node);

            for conn in self.graph.connections_from(node) {
                if let Some(degree) = in_degree.get_mut(&conn.to.node_id) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(conn.to.node_id);
                    }
                }
            }
        }

        if result.len() != subset.len() {
            let remaining: Vec<NodeId> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(&id, _)| id)
                .collect();

            return Err(GraphError::CycleDetected { nodes: remaining });
        }

        Ok(result)
    }

    /// Nodes with no incoming connections.
    pub fn roots(&self) -> Vec<NodeId> {
        self.graph
            .node_ids()
            .filter(|&id| self.graph.connections_to(id).next().is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::RenderView;
    use crate::graph::structure::{GraphNode, NodeRole};
    use crate::operations::blend::{Blend, BlendMode};
    use crate::operations::color::ColorInversion;
    use image::RgbaImage;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn source(graph: &mut RenderGraph) -> NodeId {
        graph.add_node(GraphNode::new(
            "source",
            NodeRole::Source(Arc::new(RgbaImage::new(1, 1))),
        ))
    }

    fn invert(graph: &mut RenderGraph) -> NodeId {
        graph.add_node(GraphNode::new(
            "invert",
            NodeRole::Unit(Arc::new(Mutex::new(ColorInversion))),
        ))
    }

    #[test]
    fn test_linear_order() {
        let mut graph = RenderGraph::new();
        let view = graph.add_node(GraphNode::new(
            "view",
            NodeRole::Sink(Arc::new(Mutex::new(RenderView::new()))),
        ));
        let unit = invert(&mut graph);
        let src = source(&mut graph);
        graph.connect(src, unit).unwrap();
        graph.connect(unit, view).unwrap();

        let analyzer = TopologyAnalyzer::new(&graph);
        assert_eq!(analyzer.downstream_order(src).unwrap(), vec![src, unit, view]);
        assert_eq!(analyzer.roots(), vec![src]);
    }

    #[test]
    fn test_diamond_visits_fan_in_once() {
        // source feeds the blend directly and through an inversion.
        let mut graph = RenderGraph::new();
        let src = source(&mut graph);
        let unit = invert(&mut graph);
        let mix = graph.add_node(GraphNode::new(
            "blend",
            NodeRole::Unit(Arc::new(Mutex::new(Blend::new(BlendMode::Alpha)))),
        ));
        graph.connect(src, mix).unwrap();
        graph.connect(src, unit).unwrap();
        graph.connect(unit, mix).unwrap();

        let order = TopologyAnalyzer::new(&graph).downstream_order(src).unwrap();
        assert_eq!(order, vec![src, unit, mix]);
    }

    #[test]
    fn test_downstream_excludes_other_branches() {
        let mut graph = RenderGraph::new();
        let first = source(&mut graph);
        let second = source(&mut graph);
        let unit = invert(&mut graph);
        graph.connect(second, unit).unwrap();

        let analyzer = TopologyAnalyzer::new(&graph);
        assert_eq!(analyzer.downstream_order(first).unwrap(), vec![first]);
        assert_eq!(analyzer.topological_sort().unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_root() {
        let graph = RenderGraph::new();
        let result = TopologyAnalyzer::new(&graph).downstream_order(NodeId::new());
        assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
    }
}
