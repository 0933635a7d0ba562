//! Turning a descriptor into a live graph, and taking it apart again.

use crate::core::error::{EngineError, EngineResult, GraphError, NodeId};
use crate::core::types::FilterKind;
use crate::engine::{ImageEngine, Operation, UnitHandle};
use crate::filters::descriptor::{FilterDescriptor, LiveUnit};
use image::RgbaImage;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Wiring context
// ============================================================================

/// What a custom wiring callback can touch.
///
/// The primary source, the instantiated unit and the sink are already in the
/// engine and unconnected. Every node added through the context is owned by
/// the resulting pipeline and released with it.
pub struct WiringContext<'a> {
    engine: &'a mut dyn ImageEngine,
    descriptor: &'a str,
    source: NodeId,
    unit: NodeId,
    sink: NodeId,
    extra_sources: Vec<NodeId>,
    extra_units: Vec<NodeId>,
    triggers: u64,
}

impl<'a> WiringContext<'a> {
    fn new(
        engine: &'a mut dyn ImageEngine,
        descriptor: &'a str,
        source: NodeId,
        unit: NodeId,
        sink: NodeId,
    ) -> Self {
        Self {
            engine,
            descriptor,
            source,
            unit,
            sink,
            extra_sources: Vec::new(),
            extra_units: Vec::new(),
            triggers: 0,
        }
    }

    /// Name of the descriptor being wired.
    pub fn descriptor(&self) -> &str {
        self.descriptor
    }

    /// The primary source image node.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The descriptor's own unit.
    pub fn unit(&self) -> NodeId {
        self.unit
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// Add a secondary static image. It is not processed until [`push`](Self::push).
    pub fn add_source(&mut self, image: Arc<RgbaImage>, label: &str) -> NodeId {
        let id = self
            .engine
            .add_source(image, &format!("{}/{}", self.descriptor, label));
        self.extra_sources.push(id);
        id
    }

    /// Add a helper unit, returning its node and a typed handle to configure it.
    pub fn add_unit<V: Operation>(&mut self, unit: V, label: &str) -> (NodeId, UnitHandle<V>) {
        let handle = Arc::new(Mutex::new(unit));
        let id = self
            .engine
            .add_unit(handle.clone(), &format!("{}/{}", self.descriptor, label));
        self.extra_units.push(id);
        (id, handle)
    }

    /// Connect `from` to the next free input of `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> EngineResult<()> {
        self.engine.connect(from, to)
    }

    /// Process a secondary source once so its frame is held downstream.
    ///
    /// Blend inputs fed by a static image only need one push; later triggers
    /// of the primary source reuse the held frame.
    pub fn push(&mut self, source: NodeId) -> EngineResult<()> {
        self.triggers += 1;
        self.engine.process(source)
    }
}

// ============================================================================
// Pipeline instance
// ============================================================================

/// The live graph for one selected descriptor.
///
/// Holds the instantiated unit and every node the wiring created. The sink is
/// borrowed: it is connected to but never released by the pipeline.
pub struct PipelineInstance {
    descriptor: Arc<FilterDescriptor>,
    live: Box<dyn LiveUnit>,
    source: Option<NodeId>,
    unit: NodeId,
    sink: NodeId,
    extra_sources: Vec<NodeId>,
    extra_units: Vec<NodeId>,
    value: Option<f32>,
    triggers: u64,
}

impl fmt::Debug for PipelineInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineInstance")
            .field("descriptor", &self.descriptor.name())
            .field("kind", &self.descriptor.kind())
            .field("source", &self.source)
            .field("unit", &self.unit)
            .field("sink", &self.sink)
            .field("extra_sources", &self.extra_sources)
            .field("extra_units", &self.extra_units)
            .field("value", &self.value)
            .field("triggers", &self.triggers)
            .finish()
    }
}

impl PipelineInstance {
    /// Wire the descriptor into the engine without processing anything.
    ///
    /// Secondary sources a custom wiring pushes are the exception. On failure
    /// every node created so far is disconnected and released.
    pub fn wire(
        engine: &mut dyn ImageEngine,
        descriptor: Arc<FilterDescriptor>,
        source_image: Arc<RgbaImage>,
        sink: NodeId,
    ) -> EngineResult<Self> {
        let name = descriptor.name().to_string();
        let kind = descriptor.kind();
        let live = descriptor.instantiate();

        let source = kind
            .uses_source()
            .then(|| engine.add_source(source_image, &format!("{}/source", name)));
        let unit = engine.add_unit(live.shared(), &name);

        let mut pipeline = Self {
            descriptor,
            live,
            source,
            unit,
            sink,
            extra_sources: Vec::new(),
            extra_units: Vec::new(),
            value: None,
            triggers: 0,
        };

        let wired = match (kind, source) {
            (FilterKind::Generator, _) => engine.connect(unit, sink),
            (FilterKind::Custom, Some(source)) => {
                let mut ctx = WiringContext::new(engine, &name, source, unit, sink);
                let result = pipeline.live.wire(&mut ctx);
                pipeline.extra_sources = ctx.extra_sources;
                pipeline.extra_units = ctx.extra_units;
                pipeline.triggers += ctx.triggers;
                result
            }
            (_, Some(source)) => engine
                .connect(source, unit)
                .and_then(|_| engine.connect(unit, sink)),
            (_, None) => Err(EngineError::Graph(GraphError::InvalidConnection {
                reason: format!("'{}' has no source to wire", name),
            })),
        };

        match wired {
            Ok(()) => {
                log::info!(
                    "Wired '{}' ({}) with {} extra node(s)",
                    name,
                    kind,
                    pipeline.extra_sources.len() + pipeline.extra_units.len()
                );
                Ok(pipeline)
            }
            Err(e) => {
                log::error!("Wiring '{}' failed: {}", name, e);
                if let Err(cleanup) = pipeline.tear_down(engine) {
                    log::warn!("Cleanup after failed wiring of '{}': {}", name, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Apply the default value, if the descriptor is adjustable, and push the
    /// first frame.
    pub fn start(&mut self, engine: &mut dyn ImageEngine) -> EngineResult<()> {
        if let Some(range) = self.descriptor.range() {
            if self.apply(range.default) {
                log::debug!("'{}' starts at {}", self.descriptor.name(), range.default);
            }
        }
        self.reprocess(engine)
    }

    /// Push one frame through the pipeline from its root.
    pub fn reprocess(&mut self, engine: &mut dyn ImageEngine) -> EngineResult<()> {
        self.triggers += 1;
        engine.process(self.root())
    }

    /// Run the parameter callback. Returns false if the descriptor has none.
    pub(crate) fn apply(&mut self, value: f32) -> bool {
        let applied = self.live.apply(value);
        if applied {
            self.value = Some(value);
        }
        applied
    }

    /// Disconnect and release every node the pipeline owns.
    ///
    /// All edges go first, then units, then secondary sources and the primary
    /// source last. Every step is attempted; the first error is returned.
    pub fn tear_down(self, engine: &mut dyn ImageEngine) -> EngineResult<()> {
        let mut first_error = None;
        let mut record = |result: EngineResult<()>| {
            if let Err(e) = result {
                log::warn!("Teardown step failed: {}", e);
                first_error.get_or_insert(e);
            }
        };

        for node in self.owned_nodes() {
            record(engine.disconnect_all(node).map(|_| ()));
        }

        let units = std::iter::once(self.unit).chain(self.extra_units.iter().copied());
        for node in units.chain(self.extra_sources.iter().copied()) {
            record(engine.remove_node(node));
        }
        if let Some(source) = self.source {
            record(engine.remove_node(source));
        }

        log::info!("Tore down '{}'", self.descriptor.name());
        first_error.map_or(Ok(()), Err)
    }

    /// Node triggered by [`reprocess`](Self::reprocess).
    pub fn root(&self) -> NodeId {
        self.source.unwrap_or(self.unit)
    }

    /// Every node the pipeline created, in creation order.
    pub fn owned_nodes(&self) -> Vec<NodeId> {
        self.source
            .into_iter()
            .chain(std::iter::once(self.unit))
            .chain(self.extra_sources.iter().copied())
            .chain(self.extra_units.iter().copied())
            .collect()
    }

    pub fn descriptor(&self) -> &Arc<FilterDescriptor> {
        &self.descriptor
    }

    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    pub fn unit(&self) -> NodeId {
        self.unit
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn extra_sources(&self) -> &[NodeId] {
        &self.extra_sources
    }

    pub fn extra_units(&self) -> &[NodeId] {
        &self.extra_units
    }

    /// Last value applied through the parameter callback.
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// Triggers issued so far, secondary pushes included.
    pub fn triggers(&self) -> u64 {
        self.triggers
    }
}

/// Wire a descriptor and push its first frame.
///
/// If the first frame fails the pipeline is torn down again and the error
/// returned.
pub fn build_pipeline(
    engine: &mut dyn ImageEngine,
    descriptor: Arc<FilterDescriptor>,
    source_image: Arc<RgbaImage>,
    sink: NodeId,
) -> EngineResult<PipelineInstance> {
    let mut pipeline = PipelineInstance::wire(engine, descriptor, source_image, sink)?;
    match pipeline.start(engine) {
        Ok(()) => Ok(pipeline),
        Err(e) => {
            if let Err(cleanup) = pipeline.tear_down(engine) {
                log::warn!("Cleanup after failed first frame: {}", cleanup);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Color, Frame, Size};
    use crate::engine::recording::{EngineCall, RecordingEngine};
    use crate::engine::{RenderView, SoftwareEngine};
    use crate::operations::blend::{Blend, BlendMode};
    use crate::operations::color::{Brightness, ColorInversion};
    use crate::operations::generators::SolidColor;

    fn solid(color: Color) -> Arc<RgbaImage> {
        Arc::new(Frame::solid(Size::new(8, 8), color, 0).image().clone())
    }

    fn attach_view(engine: &mut dyn ImageEngine) -> (NodeId, Arc<Mutex<RenderView>>) {
        let view = Arc::new(Mutex::new(RenderView::new()));
        let id = engine.add_sink(view.clone(), "view");
        (id, view)
    }

    fn brightness() -> Arc<FilterDescriptor> {
        Arc::new(
            FilterDescriptor::linear("Brightness", Brightness::default)
                .range(-1.0, 1.0, 0.0)
                .on_change(|unit, value| unit.brightness = value)
                .build()
                .unwrap(),
        )
    }

    fn blend_over(secondary: Arc<RgbaImage>) -> Arc<FilterDescriptor> {
        Arc::new(
            FilterDescriptor::custom("AddBlend", || Blend::new(BlendMode::Add))
                .wiring(move |ctx, _| {
                    let second = ctx.add_source(secondary.clone(), "secondary");
                    ctx.connect(ctx.source(), ctx.unit())?;
                    ctx.connect(second, ctx.unit())?;
                    ctx.connect(ctx.unit(), ctx.sink())?;
                    ctx.push(second)
                })
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_linear_chain_frames() {
        let mut engine = SoftwareEngine::new();
        let (sink, view) = attach_view(&mut engine);
        let mut pipeline =
            build_pipeline(&mut engine, brightness(), solid(Color::WHITE), sink).unwrap();

        assert_eq!(view.lock().presented(), 1);
        pipeline.reprocess(&mut engine).unwrap();
        pipeline.reprocess(&mut engine).unwrap();
        assert_eq!(view.lock().presented(), 3);
        assert_eq!(pipeline.triggers(), 3);
        assert_eq!(view.lock().history(), &[1, 2, 3]);
    }

    #[test]
    fn test_default_value_applied_before_first_frame() {
        let mut engine = SoftwareEngine::new();
        let (sink, view) = attach_view(&mut engine);
        let descriptor = Arc::new(
            FilterDescriptor::linear("Brightness", Brightness::default)
                .range(-1.0, 1.0, -1.0)
                .on_change(|unit, value| unit.brightness = value)
                .build()
                .unwrap(),
        );
        let pipeline = build_pipeline(&mut engine, descriptor, solid(Color::WHITE), sink).unwrap();

        assert_eq!(pipeline.value(), Some(-1.0));
        let view = view.lock();
        assert_eq!(view.presented(), 1);
        assert!(view.latest().unwrap().mean_luminance() < 0.01);
    }

    #[test]
    fn test_generator_never_adds_source() {
        let mut engine = RecordingEngine::new();
        let (sink, view) = attach_view(&mut engine);
        engine.clear();

        let descriptor = Arc::new(
            FilterDescriptor::generator("SolidColorGenerator", || {
                SolidColor::new(Size::new(4, 4), Color::RED)
            })
            .build()
            .unwrap(),
        );
        let pipeline = build_pipeline(&mut engine, descriptor, solid(Color::WHITE), sink).unwrap();

        assert!(pipeline.source().is_none());
        assert!(!engine
            .calls
            .iter()
            .any(|call| matches!(call, EngineCall::AddSource(_))));
        assert_eq!(engine.triggers(), vec![pipeline.unit()]);
        assert_eq!(view.lock().presented(), 1);
    }

    #[test]
    fn test_teardown_disconnects_before_release() {
        let mut engine = RecordingEngine::new();
        let (sink, _view) = attach_view(&mut engine);
        let pipeline = build_pipeline(
            &mut engine,
            blend_over(solid(Color::BLACK)),
            solid(Color::WHITE),
            sink,
        )
        .unwrap();

        let source = pipeline.source().unwrap();
        let owned = pipeline.owned_nodes();
        engine.clear();
        pipeline.tear_down(&mut engine).unwrap();

        let last_disconnect = engine
            .calls
            .iter()
            .rposition(|call| matches!(call, EngineCall::DisconnectAll(_)))
            .unwrap();
        let first_release = engine
            .position(|call| matches!(call, EngineCall::RemoveNode(_)))
            .unwrap();
        assert!(last_disconnect < first_release);
        assert_eq!(engine.calls.last(), Some(&EngineCall::RemoveNode(source)));

        for node in owned {
            assert!(!engine.inner.graph().has_node(node));
        }
        assert!(engine.inner.graph().has_node(sink));
        assert_eq!(engine.inner.graph().connection_count(), 0);
    }

    #[test]
    fn test_secondary_source_pushed_once() {
        let mut engine = RecordingEngine::new();
        let (sink, view) = attach_view(&mut engine);
        let mut pipeline = build_pipeline(
            &mut engine,
            blend_over(solid(Color::rgb(0.2, 0.2, 0.2))),
            solid(Color::rgb(0.2, 0.2, 0.2)),
            sink,
        )
        .unwrap();
        pipeline.reprocess(&mut engine).unwrap();

        let secondary = pipeline.extra_sources()[0];
        let source = pipeline.source().unwrap();
        assert_eq!(engine.triggers(), vec![secondary, source, source]);
        assert_eq!(view.lock().presented(), 2);
        let pixel = view.lock().latest().unwrap().image().get_pixel(0, 0)[0];
        assert!(pixel > 90 && pixel < 115);
    }

    #[test]
    fn test_failed_wiring_cleans_up() {
        let mut engine = SoftwareEngine::new();
        let (sink, _view) = attach_view(&mut engine);
        let descriptor = Arc::new(
            FilterDescriptor::custom("Broken", || ColorInversion)
                .wiring(|ctx, _| {
                    ctx.add_unit(ColorInversion, "helper");
                    ctx.connect(ctx.source(), ctx.unit())?;
                    // The unit only has one input.
                    ctx.connect(ctx.source(), ctx.unit())
                })
                .build()
                .unwrap(),
        );

        let result = build_pipeline(&mut engine, descriptor, solid(Color::WHITE), sink);
        assert!(matches!(
            result,
            Err(EngineError::Graph(GraphError::NoFreeInput { .. }))
        ));
        assert_eq!(engine.graph().node_count(), 1);
        assert_eq!(engine.graph().connection_count(), 0);
    }
}
