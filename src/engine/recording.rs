//! Engine wrapper that records every call, for ordering assertions in tests.

use crate::core::error::{EngineResult, NodeId};
use crate::engine::software::SoftwareEngine;
use crate::engine::{ImageEngine, SharedSink, SharedUnit};
use image::RgbaImage;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    AddSource(NodeId),
    AddUnit(NodeId),
    AddSink(NodeId),
    Connect(NodeId, NodeId),
    DisconnectAll(NodeId),
    RemoveNode(NodeId),
    Process(NodeId),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    pub inner: SoftwareEngine,
    pub calls: Vec<EngineCall>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes passed to `process`, in call order.
    pub fn triggers(&self) -> Vec<NodeId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Process(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Position of the first call matching the predicate.
    pub fn position(&self, predicate: impl Fn(&EngineCall) -> bool) -> Option<usize> {
        self.calls.iter().position(predicate)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl ImageEngine for RecordingEngine {
    fn add_source(&mut self, image: Arc<RgbaImage>, label: &str) -> NodeId {
        let id = self.inner.add_source(image, label);
        self.calls.push(EngineCall::AddSource(id));
        id
    }

    fn add_unit(&mut self, unit: SharedUnit, label: &str) -> NodeId {
        let id = self.inner.add_unit(unit, label);
        self.calls.push(EngineCall::AddUnit(id));
        id
    }

    fn add_sink(&mut self, sink: SharedSink, label: &str) -> NodeId {
        let id = self.inner.add_sink(sink, label);
        self.calls.push(EngineCall::AddSink(id));
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> EngineResult<()> {
        self.calls.push(EngineCall::Connect(from, to));
        self.inner.connect(from, to)
    }

    fn disconnect_all(&mut self, node: NodeId) -> EngineResult<usize> {
        self.calls.push(EngineCall::DisconnectAll(node));
        self.inner.disconnect_all(node)
    }

    fn remove_node(&mut self, node: NodeId) -> EngineResult<()> {
        self.calls.push(EngineCall::RemoveNode(node));
        self.inner.remove_node(node)
    }

    fn process(&mut self, root: NodeId) -> EngineResult<()> {
        self.calls.push(EngineCall::Process(root));
        self.inner.process(root)
    }
}
