//! Core types shared across Chitra.
//!
//! This module contains the foundational pieces the rest of the crate builds on:
//! - Value types (frames, colors, sizes, parameter ranges, filter kinds)
//! - Error types
//! - Configuration and persisted browsing state

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{BrowserConfig, LastViewed};
pub use error::{
    AssetError, CatalogError, ChitraError, ConfigError, ConnectionId, EngineError, GraphError,
    NodeId, OperationError, SessionError,
};
pub use types::{Color, FilterKind, Frame, ParameterRange, Position, Size};
