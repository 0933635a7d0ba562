//! Live pipelines: wiring a descriptor into an engine, driving its parameter,
//! and presenting it on a display surface.

pub mod controller;
pub mod display;
pub mod wiring;

pub use controller::{on_control_changed, ControlOutcome, ControllerPhase, ParameterController};
pub use display::{DisplaySurface, Slider, SurfaceStatus};
pub use wiring::{build_pipeline, PipelineInstance, WiringContext};
