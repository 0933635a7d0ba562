//! The detail view of one filter: a render view and an optional slider.

use crate::core::error::{NodeId, SessionError};
use crate::core::types::{Frame, ParameterRange};
use crate::engine::{ImageEngine, RenderView};
use crate::filters::descriptor::FilterDescriptor;
use crate::pipeline::controller::{ControlOutcome, ParameterController};
use image::RgbaImage;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// Slider configuration derived from a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slider {
    pub min: f32,
    pub max: f32,
    pub value: f32,
    /// Hidden when the descriptor has no parameter callback.
    pub visible: bool,
}

impl Slider {
    pub fn for_descriptor(descriptor: &FilterDescriptor) -> Self {
        let range = descriptor.range().unwrap_or(ParameterRange::new(0.0, 0.0, 0.0));
        Self {
            min: range.min,
            max: range.max,
            value: range.default,
            visible: descriptor.has_parameter_callback(),
        }
    }

    fn range(&self) -> ParameterRange {
        ParameterRange::new(self.min, self.max, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceStatus {
    Ready,
    /// The last frame did not reach the view.
    Failed(String),
}

/// A view attached to the engine, showing one pipeline.
#[derive(Debug)]
pub struct DisplaySurface {
    title: String,
    view: Arc<Mutex<RenderView>>,
    sink: NodeId,
    controller: ParameterController,
    slider: Slider,
    status: SurfaceStatus,
}

impl DisplaySurface {
    /// Attach the view, wire the descriptor and show its first frame.
    ///
    /// A processing failure on the first frame is not fatal: the surface opens
    /// in `Failed` status and can still be closed. Only a wiring failure is
    /// returned as an error, after the view has been detached again.
    pub fn open(
        engine: &mut dyn ImageEngine,
        descriptor: Arc<FilterDescriptor>,
        source: Arc<RgbaImage>,
        view: Arc<Mutex<RenderView>>,
    ) -> Result<Self, SessionError> {
        let title = descriptor.name().to_string();
        let slider = Slider::for_descriptor(&descriptor);
        let sink = engine.add_sink(view.clone(), &format!("{}/view", title));

        let mut controller = ParameterController::new();
        let status = match controller.select(engine, descriptor, source, sink) {
            Ok(()) => SurfaceStatus::Ready,
            Err(SessionError::Processing { source, .. }) => {
                log::warn!("'{}' opened without a frame: {}", title, source);
                SurfaceStatus::Failed(source.to_string())
            }
            Err(e) => {
                if let Err(detach) = engine.remove_node(sink) {
                    log::warn!("Detaching view for '{}': {}", title, detach);
                }
                return Err(e);
            }
        };

        log::info!("Opened '{}'", title);
        Ok(Self {
            title,
            view,
            sink,
            controller,
            slider,
            status,
        })
    }

    /// Move the slider. The raw value is clamped to the slider bounds.
    ///
    /// A hidden slider ignores input. Processing errors set `Failed` status
    /// and are returned; the surface stays usable.
    pub fn slide_to(
        &mut self,
        engine: &mut dyn ImageEngine,
        raw: f32,
    ) -> Result<ControlOutcome, SessionError> {
        if !self.slider.visible {
            return Ok(ControlOutcome::Ignored);
        }
        let value = self.slider.range().clamp(raw);
        self.slider.value = value;

        match self.controller.change(engine, value) {
            Ok(outcome) => {
                self.status = SurfaceStatus::Ready;
                Ok(outcome)
            }
            Err(e) => {
                if let SessionError::Processing { source, .. } = &e {
                    self.status = SurfaceStatus::Failed(source.to_string());
                }
                Err(e)
            }
        }
    }

    /// Tear the pipeline down, then detach the view.
    pub fn close(mut self, engine: &mut dyn ImageEngine) -> Result<(), SessionError> {
        let torn_down = self.controller.tear_down(engine);
        if let Err(e) = engine.remove_node(self.sink) {
            log::warn!("Detaching view for '{}': {}", self.title, e);
        }
        log::info!("Closed '{}'", self.title);
        torn_down
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slider(&self) -> Slider {
        self.slider
    }

    pub fn status(&self) -> &SurfaceStatus {
        &self.status
    }

    pub fn controller(&self) -> &ParameterController {
        &self.controller
    }

    /// Last frame the view received.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.view.lock().latest().cloned()
    }

    pub fn view(&self) -> &Arc<Mutex<RenderView>> {
        &self.view
    }
}
