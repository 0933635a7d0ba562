//! Processing units for the software engine.
//!
//! Organized by category:
//! - Generators: solid color, circle, lines, crosshairs
//! - Color: brightness, contrast, lookup, chroma keying and friends
//! - Processing: geometry, kernels, blurs, morphology
//! - Detection: histogram, corner detection and frame averages
//! - Blend: two-input blend modes
//! - Effects: pixellate, posterize, swirl and other stylizations
//! - Groups: multi-stage units the engine sees as one node

pub mod blend;
pub mod color;
pub mod detection;
pub mod effects;
pub mod generators;
pub mod groups;
pub mod pixel;
pub mod processing;

pub use blend::{Blend, BlendMode};
pub use detection::{AverageColor, AverageLuminance, CornerDetector, CornerResponse, Histogram, HistogramDisplay};
pub use generators::{Circle, Crosshair, LineSpec, Lines, SolidColor};
