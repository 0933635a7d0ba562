//! # Chitra - a declarative filter catalog
//!
//! Chitra describes image filters as data and wires them into an image
//! engine on demand. Each catalog entry says how to build its processing unit,
//! how to connect it between a source image and a display sink, and how a
//! single control value reconfigures it.
//!
//! ## Features
//!
//! - **Declarative catalog**: categories of descriptors in presentation order
//! - **Typed parameter binding**: callbacks receive the concrete unit type
//! - **Four wiring kinds**: generators, linear chains, composite groups and
//!   custom graphs with fan-out, fan-in and secondary images
//! - **Software engine**: a CPU render graph built on `image` and `imageproc`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chitra::prelude::*;
//!
//! let assets = AssetLibrary::from_dir("assets");
//! let report = build_catalog(&CatalogContext::new(&assets, Size::new(640, 640)));
//! let descriptor = report.catalog.find("BrightnessAdjustment").unwrap().1.clone();
//!
//! let mut engine = SoftwareEngine::new();
//! let view = Arc::new(Mutex::new(RenderView::new()));
//! let source = assets.load("MaYu.jpg")?;
//!
//! let mut surface = DisplaySurface::open(&mut engine, descriptor, source, view)?;
//! surface.slide_to(&mut engine, 0.25)?;
//! surface.close(&mut engine)?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: value types, errors and configuration
//! - [`graph`]: render graph storage and topology
//! - [`engine`]: the engine seam and the software engine
//! - [`operations`]: processing units
//! - [`filters`]: descriptors, the catalog and its bundled entries
//! - [`pipeline`]: wiring, parameter control and the display surface

#![warn(clippy::all)]

pub mod core;
pub mod engine;
pub mod filters;
pub mod graph;
pub mod operations;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chitra::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Color, FilterKind, Frame, ParameterRange, Position, Size};

    // Configuration
    pub use crate::core::config::{BrowserConfig, LastViewed};

    // Errors
    pub use crate::core::error::{
        AssetError, CatalogError, ChitraError, ChitraResult, EngineError, GraphError, NodeId,
        OperationError, SessionError,
    };

    // Engine
    pub use crate::engine::{
        AssetLibrary, EngineOptions, FrameSink, ImageEngine, Operation, RenderView,
        SoftwareEngine, UnitHandle,
    };

    // Catalog
    pub use crate::filters::{
        build_catalog, CatalogBuilder, CatalogContext, CatalogReport, DescriptorSummary,
        FilterCatalog, FilterDescriptor,
    };

    // Pipelines
    pub use crate::pipeline::{
        build_pipeline, on_control_changed, ControlOutcome, DisplaySurface, ParameterController,
        PipelineInstance, Slider, SurfaceStatus, WiringContext,
    };

    pub use parking_lot::Mutex;
    pub use std::sync::Arc;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
