//! Routing control changes into a live pipeline.

use crate::core::error::{EngineResult, NodeId, SessionError};
use crate::engine::ImageEngine;
use crate::filters::descriptor::FilterDescriptor;
use crate::pipeline::wiring::PipelineInstance;
use image::RgbaImage;
use std::sync::Arc;

/// What a control change did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlOutcome {
    /// The callback ran and one frame was pushed.
    Applied { value: f32 },
    /// The descriptor has no parameter callback; nothing happened.
    Ignored,
}

/// Apply a control value and push one frame.
///
/// The value is passed through as is; clamping is the caller's concern.
pub fn on_control_changed(
    engine: &mut dyn ImageEngine,
    pipeline: &mut PipelineInstance,
    value: f32,
) -> EngineResult<ControlOutcome> {
    if !pipeline.apply(value) {
        return Ok(ControlOutcome::Ignored);
    }
    pipeline.reprocess(engine)?;
    Ok(ControlOutcome::Applied { value })
}

/// Lifecycle phase of a [`ParameterController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Wired,
    TornDown,
}

#[derive(Debug)]
enum ControllerState {
    Idle,
    Wired(PipelineInstance),
    TornDown { descriptor: String, triggers: u64 },
}

/// One selection's worth of pipeline: `Idle → Wired → TornDown`.
///
/// A controller wires at most once. Selecting another entry means a new
/// controller and a fresh pipeline.
#[derive(Debug)]
pub struct ParameterController {
    state: ControllerState,
}

impl Default for ParameterController {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Idle,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        match self.state {
            ControllerState::Idle => ControllerPhase::Idle,
            ControllerState::Wired(_) => ControllerPhase::Wired,
            ControllerState::TornDown { .. } => ControllerPhase::TornDown,
        }
    }

    pub fn pipeline(&self) -> Option<&PipelineInstance> {
        match &self.state {
            ControllerState::Wired(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    /// Triggers issued so far, including after teardown.
    pub fn triggers(&self) -> u64 {
        match &self.state {
            ControllerState::Idle => 0,
            ControllerState::Wired(pipeline) => pipeline.triggers(),
            ControllerState::TornDown { triggers, .. } => *triggers,
        }
    }

    /// Wire the descriptor and push the first frame.
    ///
    /// A failed first frame leaves the controller wired so the pipeline can
    /// still be torn down; the error is returned as `SessionError::Processing`.
    pub fn select(
        &mut self,
        engine: &mut dyn ImageEngine,
        descriptor: Arc<FilterDescriptor>,
        source: Arc<RgbaImage>,
        sink: NodeId,
    ) -> Result<(), SessionError> {
        match &self.state {
            ControllerState::Idle => {}
            ControllerState::Wired(pipeline) => {
                return Err(SessionError::AlreadyWired(pipeline.descriptor().name().to_string()))
            }
            ControllerState::TornDown { descriptor, .. } => {
                return Err(SessionError::TornDown(descriptor.clone()))
            }
        }

        let name = descriptor.name().to_string();
        let mut pipeline = PipelineInstance::wire(engine, descriptor, source, sink).map_err(
            |source| SessionError::Wiring {
                descriptor: name.clone(),
                source,
            },
        )?;

        let started = pipeline.start(engine);
        self.state = ControllerState::Wired(pipeline);
        started.map_err(|source| SessionError::Processing {
            descriptor: name,
            source,
        })
    }

    /// Route a control change into the wired pipeline.
    pub fn change(
        &mut self,
        engine: &mut dyn ImageEngine,
        value: f32,
    ) -> Result<ControlOutcome, SessionError> {
        match &mut self.state {
            ControllerState::Idle => Err(SessionError::NotWired),
            ControllerState::TornDown { descriptor, .. } => {
                Err(SessionError::TornDown(descriptor.clone()))
            }
            ControllerState::Wired(pipeline) => on_control_changed(engine, pipeline, value)
                .map_err(|source| SessionError::Processing {
                    descriptor: pipeline.descriptor().name().to_string(),
                    source,
                }),
        }
    }

    /// Tear the pipeline down. The controller is finished afterwards.
    pub fn tear_down(&mut self, engine: &mut dyn ImageEngine) -> Result<(), SessionError> {
        let state = std::mem::replace(&mut self.state, ControllerState::Idle);
        match state {
            ControllerState::Idle => Err(SessionError::NotWired),
            ControllerState::TornDown { descriptor, triggers } => {
                let name = descriptor.clone();
                self.state = ControllerState::TornDown { descriptor, triggers };
                Err(SessionError::TornDown(name))
            }
            ControllerState::Wired(pipeline) => {
                let descriptor = pipeline.descriptor().name().to_string();
                let triggers = pipeline.triggers();
                let result = pipeline.tear_down(engine);
                self.state = ControllerState::TornDown {
                    descriptor: descriptor.clone(),
                    triggers,
                };
                result.map_err(|source| SessionError::Wiring { descriptor, source })
            }
        }
    }
}
