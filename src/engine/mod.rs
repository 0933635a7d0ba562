//! The image engine seam.
//!
//! The pipeline layer talks to an engine only through [`ImageEngine`]. Nodes
//! are sources (static images), units ([`Operation`]s) and sinks
//! ([`FrameSink`]s). The crate ships [`SoftwareEngine`], a CPU implementation
//! built on `image` and `imageproc`.

pub mod assets;
pub mod sink;
pub mod software;

#[cfg(test)]
pub(crate) mod recording;

use crate::core::error::{EngineResult, NodeId, OperationError};
use crate::core::types::Frame;
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;

pub use assets::AssetLibrary;
pub use sink::RenderView;
pub use software::{EngineOptions, EngineStats, SoftwareEngine};

/// One processing unit.
pub trait Operation: Send + 'static {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Number of input frames the unit consumes per render.
    fn inputs(&self) -> usize {
        1
    }

    /// Produce an output frame from the current input frames, in slot order.
    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError>;
}

/// A surface that displays frames.
pub trait FrameSink: Send + 'static {
    fn present(&mut self, frame: &Frame);
}

/// A unit shared between the engine and the pipeline that configures it.
pub type SharedUnit = Arc<Mutex<dyn Operation>>;

/// A sink shared between the engine and the display that reads it.
pub type SharedSink = Arc<Mutex<dyn FrameSink>>;

/// A typed handle to a unit the engine also holds.
pub type UnitHandle<U> = Arc<Mutex<U>>;

/// Abstract image engine.
///
/// Triggers are synchronous: when [`process`](ImageEngine::process) returns,
/// the frame has reached every downstream node.
pub trait ImageEngine {
    /// Add a static image node.
    fn add_source(&mut self, image: Arc<RgbaImage>, label: &str) -> NodeId;

    /// Add a processing unit.
    fn add_unit(&mut self, unit: SharedUnit, label: &str) -> NodeId;

    /// Add a display sink.
    fn add_sink(&mut self, sink: SharedSink, label: &str) -> NodeId;

    /// Connect `from`'s output to the next free input of `to`.
    fn connect(&mut self, from: NodeId, to: NodeId) -> EngineResult<()>;

    /// Remove every connection of a node, returning how many were removed.
    fn disconnect_all(&mut self, node: NodeId) -> EngineResult<usize>;

    /// Release a node. Fails while it still has connections.
    fn remove_node(&mut self, node: NodeId) -> EngineResult<()>;

    /// Push one frame from a source or zero-input unit through the graph.
    fn process(&mut self, root: NodeId) -> EngineResult<()>;
}
