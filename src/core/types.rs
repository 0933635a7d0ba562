//! Core value types shared by the catalog, the pipeline and the engine.
//!
//! Frames wrap their pixel data in an `Arc` so fan-out connections share one
//! buffer instead of copying it per downstream node.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pipeline shape a descriptor requests from the wiring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// No upstream source; the unit feeds the sink directly.
    Generator,
    /// source → unit → sink
    LinearChain,
    /// source → opaque multi-stage unit → sink
    CompositeGroup,
    /// The descriptor wires the graph itself.
    Custom,
}

impl FilterKind {
    /// Get the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterKind::Generator => "Generator",
            FilterKind::LinearChain => "LinearChain",
            FilterKind::CompositeGroup => "CompositeGroup",
            FilterKind::Custom => "Custom",
        }
    }

    /// Input arity the unit must have for the default wiring of this kind.
    ///
    /// `None` for `Custom`, whose wiring decides what the unit is fed.
    pub fn expected_inputs(&self) -> Option<usize> {
        match self {
            FilterKind::Generator => Some(0),
            FilterKind::LinearChain | FilterKind::CompositeGroup => Some(1),
            FilterKind::Custom => None,
        }
    }

    /// Whether pipelines of this kind are driven by a primary source.
    pub fn uses_source(&self) -> bool {
        !matches!(self, FilterKind::Generator)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Bounds and initial value of the single control parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Initial value.
    pub default: f32,
}

impl ParameterRange {
    /// Create a range. Use [`is_valid`](Self::is_valid) to check it.
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// All three values are finite and `min <= default <= max`.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.default.is_finite()
            && self.min <= self.default
            && self.default <= self.max
    }

    /// Clamp a raw control value into `[min, max]`.
    ///
    /// NaN maps to the default value.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

/// RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    /// Create a color from components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Components as an array.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Convert to an 8-bit pixel, clamping each component.
    pub fn to_rgba8(&self) -> Rgba<u8> {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([q(self.r), q(self.g), q(self.b), q(self.a)])
    }
}

/// Point in normalized image coordinates (`0.0..=1.0`, origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const CENTER: Position = Position::new(0.5, 0.5);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Map to pixel coordinates in an image of the given size.
    pub fn to_pixel(&self, size: Size) -> (f32, f32) {
        (self.x * size.width as f32, self.y * size.height as f32)
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One image pushed through the graph.
///
/// `generation` is the sequence number of the trigger that produced the frame,
/// so a sink can tell which trigger it is looking at.
#[derive(Debug, Clone)]
pub struct Frame {
    image: Arc<RgbaImage>,
    generation: u64,
}

impl Frame {
    /// Wrap an image produced by the given trigger.
    pub fn new(image: RgbaImage, generation: u64) -> Self {
        Self {
            image: Arc::new(image),
            generation,
        }
    }

    /// Wrap shared pixel data without copying it.
    pub fn shared(image: Arc<RgbaImage>, generation: u64) -> Self {
        Self { image, generation }
    }

    /// A frame filled with one color.
    pub fn solid(size: Size, color: Color, generation: u64) -> Self {
        Self::new(
            RgbaImage::from_pixel(size.width, size.height, color.to_rgba8()),
            generation,
        )
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    /// Mean Rec. 709 luminance over all pixels, in `0.0..=1.0`.
    pub fn mean_luminance(&self) -> f32 {
        let count = self.size().pixels();
        if count == 0 {
            return 0.0;
        }
        let total: f64 = self
            .image
            .pixels()
            .map(|p| {
                (0.2125 * p[0] as f64 + 0.7154 * p[1] as f64 + 0.0721 * p[2] as f64) / 255.0
            })
            .sum();
        (total / count as f64) as f32
    }
}
