//! Two-input blend units.
//!
//! Input 0 is the base frame and input 1 the overlay. The overlay is resized
//! to the base size when they differ; the output always has the base size.

use crate::core::error::OperationError;
use crate::core::types::{Color, Frame};
use crate::engine::Operation;
use crate::operations::color::chroma;
use crate::operations::pixel::{expect_inputs, mix, non_empty, pack_rgba, smoothstep, unit_rgba};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    Alpha,
    Dissolve,
    Multiply,
    Add,
    Subtract,
    Divide,
    Overlay,
    Darken,
    Lighten,
    ColorBurn,
    ColorDodge,
    Screen,
    Exclusion,
    Difference,
    HardLight,
    SoftLight,
    SourceOver,
    Normal,
    LinearBurn,
    /// Overlay hue and saturation with base luminosity.
    Color,
    /// Overlay hue with base saturation and luminosity.
    Hue,
    /// Overlay saturation with base hue and luminosity.
    Saturation,
    /// Overlay luminosity with base hue and saturation.
    Luminosity,
    /// Replaces pixels close to the key color with the overlay.
    ChromaKey,
}

impl BlendMode {
    pub const ALL: [BlendMode; 24] = [
        BlendMode::ChromaKey,
        BlendMode::Dissolve,
        BlendMode::Multiply,
        BlendMode::Add,
        BlendMode::Subtract,
        BlendMode::Divide,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorBurn,
        BlendMode::ColorDodge,
        BlendMode::Screen,
        BlendMode::Exclusion,
        BlendMode::Difference,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Alpha,
        BlendMode::SourceOver,
        BlendMode::Normal,
        BlendMode::Color,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Luminosity,
        BlendMode::LinearBurn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Alpha => "AlphaBlend",
            BlendMode::Dissolve => "DissolveBlend",
            BlendMode::Multiply => "MultiplyBlend",
            BlendMode::Add => "AddBlend",
            BlendMode::Subtract => "SubtractBlend",
            BlendMode::Divide => "DivideBlend",
            BlendMode::Overlay => "OverlayBlend",
            BlendMode::Darken => "DarkenBlend",
            BlendMode::Lighten => "LightenBlend",
            BlendMode::ColorBurn => "ColorBurnBlend",
            BlendMode::ColorDodge => "ColorDodgeBlend",
            BlendMode::Screen => "ScreenBlend",
            BlendMode::Exclusion => "ExclusionBlend",
            BlendMode::Difference => "DifferenceBlend",
            BlendMode::HardLight => "HardLightBlend",
            BlendMode::SoftLight => "SoftLightBlend",
            BlendMode::SourceOver => "SourceOverBlend",
            BlendMode::Normal => "NormalBlend",
            BlendMode::LinearBurn => "LinearBurnBlend",
            BlendMode::Color => "ColorBlend",
            BlendMode::Hue => "HueBlend",
            BlendMode::Saturation => "SaturationBlend",
            BlendMode::Luminosity => "LuminosityBlend",
            BlendMode::ChromaKey => "ChromaKeyBlend",
        }
    }

    /// Whether the mode reads the `mix` field.
    pub fn uses_mix(&self) -> bool {
        matches!(self, BlendMode::Alpha | BlendMode::Dissolve)
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Non-separable modes work on whole RGB triples with these weights.
const LUM: [f32; 3] = [0.3, 0.59, 0.11];

fn lum(c: [f32; 3]) -> f32 {
    c[0] * LUM[0] + c[1] * LUM[1] + c[2] * LUM[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > f32::EPSILON {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    if max - min <= f32::EPSILON {
        return [0.0; 3];
    }
    c.map(|v| (v - min) * s / (max - min))
}

/// Combines a base and an overlay frame.
#[derive(Debug, Clone)]
pub struct Blend {
    pub mode: BlendMode,
    /// Overlay weight for `Alpha` and `Dissolve`.
    pub mix: f32,
    /// Key settings for `ChromaKey`.
    pub threshold_sensitivity: f32,
    pub smoothing: f32,
    pub key: Color,
}

impl Blend {
    pub fn new(mode: BlendMode) -> Self {
        Self {
            mode,
            mix: 0.5,
            threshold_sensitivity: 0.4,
            smoothing: 0.1,
            key: Color::GREEN,
        }
    }

    pub fn with_mix(mut self, mix: f32) -> Self {
        self.mix = mix;
        self
    }

    fn blend(&self, base: [f32; 4], overlay: [f32; 4]) -> [f32; 4] {
        let per_channel = |f: &dyn Fn(f32, f32) -> f32| {
            [f(base[0], overlay[0]), f(base[1], overlay[1]), f(base[2], overlay[2]), base[3]]
        };

        match self.mode {
            BlendMode::Alpha => {
                let t = overlay[3] * self.mix;
                per_channel(&|b, o| mix(b, o, t))
            }
            BlendMode::Dissolve => [
                mix(base[0], overlay[0], self.mix),
                mix(base[1], overlay[1], self.mix),
                mix(base[2], overlay[2], self.mix),
                mix(base[3], overlay[3], self.mix),
            ],
            BlendMode::Multiply => {
                let (ba, oa) = (base[3], overlay[3]);
                let f = |b: f32, o: f32| o * b + o * (1.0 - ba) + b * (1.0 - oa);
                [
                    f(base[0], overlay[0]),
                    f(base[1], overlay[1]),
                    f(base[2], overlay[2]),
                    f(base[3], overlay[3]),
                ]
            }
            BlendMode::Add => per_channel(&|b, o| b + o),
            BlendMode::Subtract => per_channel(&|b, o| b - o),
            BlendMode::Divide => per_channel(&|b, o| if o <= 0.0 { 1.0 } else { b / o }),
            BlendMode::Overlay => per_channel(&|b, o| {
                if b < 0.5 {
                    2.0 * b * o
                } else {
                    1.0 - 2.0 * (1.0 - b) * (1.0 - o)
                }
            }),
            BlendMode::Darken => per_channel(&|b, o| b.min(o)),
            BlendMode::Lighten => per_channel(&|b, o| b.max(o)),
            BlendMode::ColorBurn => per_channel(&|b, o| {
                if o <= 0.0 {
                    0.0
                } else {
                    1.0 - (1.0 - b) / o
                }
            }),
            BlendMode::ColorDodge => per_channel(&|b, o| {
                if o >= 1.0 {
                    1.0
                } else {
                    b / (1.0 - o)
                }
            }),
            BlendMode::Screen => per_channel(&|b, o| 1.0 - (1.0 - b) * (1.0 - o)),
            BlendMode::Exclusion => per_channel(&|b, o| b + o - 2.0 * b * o),
            BlendMode::Difference => per_channel(&|b, o| (b - o).abs()),
            BlendMode::HardLight => per_channel(&|b, o| {
                if o < 0.5 {
                    2.0 * b * o
                } else {
                    1.0 - 2.0 * (1.0 - b) * (1.0 - o)
                }
            }),
            BlendMode::SoftLight => per_channel(&|b, o| 2.0 * b * o + b * b * (1.0 - 2.0 * o)),
            BlendMode::SourceOver | BlendMode::Normal => {
                let t = overlay[3];
                [
                    mix(base[0], overlay[0], t),
                    mix(base[1], overlay[1], t),
                    mix(base[2], overlay[2], t),
                    t + base[3] * (1.0 - t),
                ]
            }
            BlendMode::LinearBurn => per_channel(&|b, o| b + o - 1.0),
            BlendMode::Color | BlendMode::Hue | BlendMode::Saturation | BlendMode::Luminosity => {
                let b = [base[0], base[1], base[2]];
                let o = [overlay[0], overlay[1], overlay[2]];
                let mixed = match self.mode {
                    BlendMode::Color => set_lum(o, lum(b)),
                    BlendMode::Hue => set_lum(set_sat(o, sat(b)), lum(b)),
                    BlendMode::Saturation => set_lum(set_sat(b, sat(o)), lum(b)),
                    _ => set_lum(b, lum(o)),
                };
                let t = overlay[3];
                [
                    mix(base[0], mixed[0], t),
                    mix(base[1], mixed[1], t),
                    mix(base[2], mixed[2], t),
                    base[3],
                ]
            }
            BlendMode::ChromaKey => {
                let (key_cr, key_cb) = chroma(self.key.r, self.key.g, self.key.b);
                let (cr, cb) = chroma(base[0], base[1], base[2]);
                let distance = ((cr - key_cr).powi(2) + (cb - key_cb).powi(2)).sqrt();
                let replace = 1.0
                    - smoothstep(
                        self.threshold_sensitivity,
                        self.threshold_sensitivity + self.smoothing,
                        distance,
                    );
                [
                    mix(base[0], overlay[0], replace),
                    mix(base[1], overlay[1], replace),
                    mix(base[2], overlay[2], replace),
                    mix(base[3], overlay[3], replace),
                ]
            }
        }
    }
}

impl Operation for Blend {
    fn name(&self) -> &'static str {
        self.mode.name()
    }

    fn inputs(&self) -> usize {
        2
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        expect_inputs(self.name(), 2, inputs)?;
        let base = inputs[0].image();
        non_empty(self.name(), base)?;
        let overlay = inputs[1].image();

        let overlay: Cow<'_, RgbaImage> = if overlay.dimensions() == base.dimensions() {
            Cow::Borrowed(overlay)
        } else if overlay.width() == 0 || overlay.height() == 0 {
            return Err(OperationError::Failed {
                operation: self.mode.name(),
                reason: "overlay frame is empty".to_string(),
            });
        } else {
            Cow::Owned(imageops::resize(
                overlay,
                base.width(),
                base.height(),
                FilterType::Triangle,
            ))
        };

        let mut result = base.clone();
        for (x, y, pixel) in result.enumerate_pixels_mut() {
            let blended = self.blend(unit_rgba(pixel), unit_rgba(overlay.get_pixel(x, y)));
            *pixel = pack_rgba(blended);
        }
        Ok(result)
    }
}
