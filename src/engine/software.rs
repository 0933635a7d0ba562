//! CPU reference engine.
//!
//! Frames are pushed synchronously from a trigger root through every
//! downstream node in topological order.

use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, EngineResult, NodeId};
use crate::core::types::{Frame, Size};
use crate::engine::{ImageEngine, SharedSink, SharedUnit};
use crate::graph::structure::{GraphNode, NodeRole, RenderGraph};
use crate::graph::topology::TopologyAnalyzer;
use image::RgbaImage;
use std::collections::HashSet;
use std::sync::Arc;

/// Engine options.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Largest frame a unit may produce, in pixels.
    pub max_frame_pixels: Option<u64>,
}

impl EngineOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the frame budget.
    pub fn with_max_frame_pixels(mut self, limit: u64) -> Self {
        self.max_frame_pixels = Some(limit);
        self
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_frame_pixels: config.max_frame_pixels,
        }
    }
}

/// Processing statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Number of triggers processed.
    pub passes: u64,
    /// Number of unit renders.
    pub units_rendered: u64,
    /// Number of frames handed to sinks.
    pub frames_presented: u64,
}

/// The software engine.
#[derive(Debug, Default)]
pub struct SoftwareEngine {
    graph: RenderGraph,
    options: EngineOptions,
    generation: u64,
    stats: EngineStats,
}

impl SoftwareEngine {
    /// Create a new engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying graph.
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    /// Generation number of the most recent trigger.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Last frame a node emitted.
    pub fn last_output(&self, node: NodeId) -> Option<&Frame> {
        self.graph
            .get_node(node)
            .ok()
            .and_then(|n| n.last_output.as_ref())
    }

    fn add(&mut self, label: &str, role: NodeRole) -> NodeId {
        let node = GraphNode::new(label, role);
        log::debug!("Adding {} node '{}' ({})", node_kind(&node.role), label, node.id);
        self.graph.add_node(node)
    }

    /// Frames feeding each input slot of a node, or `None` if a slot is empty.
    fn gather_inputs(&self, node: &GraphNode) -> Option<Vec<Frame>> {
        (0..node.inputs)
            .map(|slot| {
                self.graph
                    .connection_into(node.id, slot)
                    .and_then(|conn| self.graph.get_node(conn.from).ok())
                    .and_then(|upstream| upstream.last_output.clone())
            })
            .collect()
    }

    fn check_budget(&self, node: &GraphNode, size: Size) -> EngineResult<()> {
        if let Some(limit) = self.options.max_frame_pixels {
            let required = size.pixels();
            if required > limit {
                return Err(EngineError::ResourceExhausted {
                    node_id: node.id,
                    label: node.label.clone(),
                    required,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Render one node for the current pass. Returns the frame it emits.
    fn render_node(&mut self, node: &GraphNode, inputs: &[Frame]) -> EngineResult<Option<Frame>> {
        let generation = self.generation;
        match &node.role {
            NodeRole::Source(image) => Ok(Some(Frame::shared(Arc::clone(image), generation))),
            NodeRole::Unit(unit) => {
                let image = unit.lock().render(inputs).map_err(|e| {
                    log::error!("Unit '{}' failed: {}", node.label, e);
                    EngineError::ProcessingFailed {
                        node_id: node.id,
                        label: node.label.clone(),
                        reason: e.to_string(),
                    }
                })?;
                self.check_budget(node, Size::new(image.width(), image.height()))?;
                self.stats.units_rendered += 1;
                Ok(Some(Frame::new(image, generation)))
            }
            NodeRole::Sink(sink) => {
                if let Some(frame) = inputs.first() {
                    sink.lock().present(frame);
                    self.stats.frames_presented += 1;
                }
                Ok(None)
            }
        }
    }
}

fn node_kind(role: &NodeRole) -> &'static str {
    match role {
        NodeRole::Source(_) => "source",
        NodeRole::Unit(_) => "unit",
        NodeRole::Sink(_) => "sink",
    }
}

impl ImageEngine for SoftwareEngine {
    fn add_source(&mut self, image: Arc<RgbaImage>, label: &str) -> NodeId {
        self.add(label, NodeRole::Source(image))
    }

    fn add_unit(&mut self, unit: SharedUnit, label: &str) -> NodeId {
        self.add(label, NodeRole::Unit(unit))
    }

    fn add_sink(&mut self, sink: SharedSink, label: &str) -> NodeId {
        self.add(label, NodeRole::Sink(sink))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> EngineResult<()> {
        self.graph.connect(from, to)?;
        Ok(())
    }

    fn disconnect_all(&mut self, node: NodeId) -> EngineResult<usize> {
        Ok(self.graph.disconnect_all(node)?)
    }

    fn remove_node(&mut self, node: NodeId) -> EngineResult<()> {
        let removed = self.graph.remove_node(node)?;
        log::debug!("Released node '{}' ({})", removed.label, node);
        Ok(())
    }

    fn process(&mut self, root: NodeId) -> EngineResult<()> {
        let root_node = self.graph.get_node(root)?;
        if root_node.inputs > 0 {
            return Err(EngineError::NotTriggerable {
                node_id: root,
                label: root_node.label.clone(),
            });
        }

        let order = TopologyAnalyzer::new(&self.graph).downstream_order(root)?;
        self.generation += 1;
        self.stats.passes += 1;
        log::debug!(
            "Pass {} from '{}' over {} node(s)",
            self.generation,
            root_node.label,
            order.len()
        );

        let mut fresh: HashSet<NodeId> = HashSet::new();

        for node_id in order {
            let node = self.graph.get_node(node_id)?.clone();

            let inputs = if node_id == root {
                Vec::new()
            } else {
                let refreshed = self
                    .graph
                    .connections_to(node_id)
                    .any(|conn| fresh.contains(&conn.from));
                if !refreshed {
                    continue;
                }
                match self.gather_inputs(&node) {
                    Some(inputs) => inputs,
                    None => {
                        log::debug!("Skipping '{}': not every input holds a frame", node.label);
                        continue;
                    }
                }
            };

            if let Some(frame) = self.render_node(&node, &inputs)? {
                self.graph.get_node_mut(node_id)?.last_output = Some(frame);
                fresh.insert(node_id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GraphError;
    use crate::core::types::Color;
    use crate::engine::sink::RenderView;
    use crate::operations::blend::{Blend, BlendMode};
    use crate::operations::color::{Brightness, ColorInversion};
    use crate::operations::generators::SolidColor;
    use parking_lot::Mutex;

    fn solid(color: Color) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(4, 4, color.to_rgba8()))
    }

    fn view() -> (Arc<Mutex<RenderView>>, SharedSink) {
        let view = Arc::new(Mutex::new(RenderView::new()));
        let sink: SharedSink = view.clone();
        (view, sink)
    }

    #[test]
    fn test_linear_pass() {
        let mut engine = SoftwareEngine::new();
        let (view, sink) = view();
        let sink = engine.add_sink(sink, "view");
        let source = engine.add_source(solid(Color::BLACK), "source");
        let unit = engine.add_unit(Arc::new(Mutex::new(ColorInversion)), "invert");

        engine.connect(source, unit).unwrap();
        engine.connect(unit, sink).unwrap();
        engine.process(source).unwrap();
        engine.process(source).unwrap();

        let view = view.lock();
        assert_eq!(view.history(), &[1, 2]);
        assert_eq!(view.latest().unwrap().image().get_pixel(0, 0)[0], 255);
        assert_eq!(engine.stats().units_rendered, 2);
    }

    #[test]
    fn test_generator_root() {
        let mut engine = SoftwareEngine::new();
        let (view, sink) = view();
        let sink = engine.add_sink(sink, "view");
        let unit = engine.add_unit(
            Arc::new(Mutex::new(SolidColor::new(Size::new(8, 8), Color::RED))),
            "solid",
        );
        engine.connect(unit, sink).unwrap();
        engine.process(unit).unwrap();

        assert_eq!(view.lock().presented(), 1);
        assert_eq!(engine.last_output(unit).unwrap().size(), Size::new(8, 8));
    }

    #[test]
    fn test_fan_in_renders_once_per_pass() {
        let mut engine = SoftwareEngine::new();
        let (view, sink) = view();
        let sink = engine.add_sink(sink, "view");
        let source = engine.add_source(solid(Color::WHITE), "source");
        let dim = engine.add_unit(Arc::new(Mutex::new(Brightness::new(-1.0))), "dim");
        let mix = engine.add_unit(Arc::new(Mutex::new(Blend::new(BlendMode::Alpha))), "mix");

        engine.connect(source, mix).unwrap();
        engine.connect(source, dim).unwrap();
        engine.connect(dim, mix).unwrap();
        engine.connect(mix, sink).unwrap();
        engine.process(source).unwrap();

        assert_eq!(view.lock().history(), &[1]);
        assert_eq!(engine.stats().units_rendered, 2);
    }

    #[test]
    fn test_secondary_source_is_reused() {
        // The second blend input is pushed once; later passes reuse its frame.
        let mut engine = SoftwareEngine::new();
        let (view, sink) = view();
        let sink = engine.add_sink(sink, "view");
        let source = engine.add_source(solid(Color::WHITE), "source");
        let overlay = engine.add_source(solid(Color::BLACK), "overlay");
        let mix = engine.add_unit(Arc::new(Mutex::new(Blend::new(BlendMode::Alpha))), "mix");

        engine.connect(source, mix).unwrap();
        engine.connect(overlay, mix).unwrap();
        engine.connect(mix, sink).unwrap();

        engine.process(source).unwrap();
        assert_eq!(view.lock().presented(), 0);

        engine.process(overlay).unwrap();
        engine.process(source).unwrap();
        assert_eq!(view.lock().history(), &[2, 3]);
    }

    #[test]
    fn test_unit_with_inputs_is_not_triggerable() {
        let mut engine = SoftwareEngine::new();
        let unit = engine.add_unit(Arc::new(Mutex::new(ColorInversion)), "invert");
        assert!(matches!(
            engine.process(unit),
            Err(EngineError::NotTriggerable { .. })
        ));
    }

    #[test]
    fn test_frame_budget() {
        let mut engine =
            SoftwareEngine::new().with_options(EngineOptions::new().with_max_frame_pixels(10));
        let source = engine.add_source(solid(Color::WHITE), "source");
        let unit = engine.add_unit(Arc::new(Mutex::new(ColorInversion)), "invert");
        engine.connect(source, unit).unwrap();

        let result = engine.process(source);
        assert!(matches!(
            result,
            Err(EngineError::ResourceExhausted { required: 16, limit: 10, .. })
        ));
    }

    #[test]
    fn test_release_requires_disconnect() {
        let mut engine = SoftwareEngine::new();
        let source = engine.add_source(solid(Color::WHITE), "source");
        let unit = engine.add_unit(Arc::new(Mutex::new(ColorInversion)), "invert");
        engine.connect(source, unit).unwrap();

        assert_eq!(
            engine.remove_node(source),
            Err(EngineError::Graph(GraphError::NodeHasConnections(source)))
        );
        assert_eq!(engine.disconnect_all(unit).unwrap(), 1);
        engine.remove_node(source).unwrap();
        engine.remove_node(unit).unwrap();
        assert!(engine.graph().is_empty());
    }
}
