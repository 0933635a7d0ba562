//! Per-pixel color adjustments.
//!
//! All units here take one input and keep its size.

use crate::core::error::OperationError;
use crate::core::types::{Color, Frame};
use crate::engine::Operation;
use crate::operations::pixel::{luminance, map_pixels, map_pixels_at, mix, sample_normalized, single_input, smoothstep};
use image::RgbaImage;
use std::sync::Arc;

/// Declares a one-input unit whose render is a pure per-pixel map.
macro_rules! pixel_unit {
    ($ty:ident, $name:literal, |$unit:ident, $c:ident| $body:expr) => {
        impl Operation for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
                let image = single_input($name, inputs)?;
                let $unit = &*self;
                Ok(map_pixels(image, |$c| $body))
            }
        }
    };
}

/// Adds a constant to every color channel.
#[derive(Debug, Clone, Default)]
pub struct Brightness {
    /// `-1.0..=1.0`
    pub brightness: f32,
}

impl Brightness {
    pub fn new(brightness: f32) -> Self {
        Self { brightness }
    }
}

pixel_unit!(Brightness, "Brightness", |unit, c| {
    let b = unit.brightness;
    [c[0] + b, c[1] + b, c[2] + b, c[3]]
});

/// Scales color by `2^exposure`.
#[derive(Debug, Clone, Default)]
pub struct Exposure {
    pub exposure: f32,
}

pixel_unit!(Exposure, "Exposure", |unit, c| {
    let k = 2f32.powf(unit.exposure);
    [c[0] * k, c[1] * k, c[2] * k, c[3]]
});

/// Stretches color away from mid-gray.
#[derive(Debug, Clone)]
pub struct Contrast {
    pub contrast: f32,
}

impl Default for Contrast {
    fn default() -> Self {
        Self { contrast: 1.0 }
    }
}

pixel_unit!(Contrast, "Contrast", |unit, c| {
    let k = unit.contrast;
    [
        (c[0] - 0.5) * k + 0.5,
        (c[1] - 0.5) * k + 0.5,
        (c[2] - 0.5) * k + 0.5,
        c[3],
    ]
});

/// Mixes between grayscale (0) and the unmodified color (1) or beyond.
#[derive(Debug, Clone)]
pub struct Saturation {
    pub saturation: f32,
}

impl Default for Saturation {
    fn default() -> Self {
        Self { saturation: 1.0 }
    }
}

pixel_unit!(Saturation, "Saturation", |unit, c| {
    let l = luminance(&c);
    let s = unit.saturation;
    [mix(l, c[0], s), mix(l, c[1], s), mix(l, c[2], s), c[3]]
});

/// Raises every channel to a power.
#[derive(Debug, Clone)]
pub struct Gamma {
    pub gamma: f32,
}

impl Default for Gamma {
    fn default() -> Self {
        Self { gamma: 1.0 }
    }
}

pixel_unit!(Gamma, "Gamma", |unit, c| {
    let g = unit.gamma;
    [c[0].powf(g), c[1].powf(g), c[2].powf(g), c[3]]
});

/// Per-channel multipliers.
#[derive(Debug, Clone)]
pub struct RgbAdjustment {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Default for RgbAdjustment {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
        }
    }
}

pixel_unit!(RgbAdjustment, "RgbAdjustment", |unit, c| {
    [c[0] * unit.red, c[1] * unit.green, c[2] * unit.blue, c[3]]
});

/// Rotates hue in YIQ space.
#[derive(Debug, Clone)]
pub struct Hue {
    /// Degrees.
    pub hue: f32,
}

impl Default for Hue {
    fn default() -> Self {
        Self { hue: 90.0 }
    }
}

pixel_unit!(Hue, "Hue", |unit, c| {
    let y = 0.299 * c[0] + 0.587 * c[1] + 0.114 * c[2];
    let i = 0.595716 * c[0] - 0.274453 * c[1] - 0.321263 * c[2];
    let q = 0.211456 * c[0] - 0.522591 * c[1] + 0.31135 * c[2];

    let chroma = (i * i + q * q).sqrt();
    let angle = q.atan2(i) - (unit.hue % 360.0).to_radians();
    let (q, i) = (chroma * angle.sin(), chroma * angle.cos());

    [
        y + 0.9563 * i + 0.6210 * q,
        y - 0.2721 * i - 0.6474 * q,
        y - 1.1070 * i + 1.7046 * q,
        c[3],
    ]
});

/// Sepia weights, rows are output channels.
pub const SEPIA_MATRIX: [f32; 16] = [
    0.3588, 0.7044, 0.1368, 0.0, //
    0.2990, 0.5870, 0.1140, 0.0, //
    0.2392, 0.4696, 0.0912, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Multiplies color by a row-major 4x4 matrix, mixed in by `intensity`.
#[derive(Debug, Clone)]
pub struct ColorMatrix {
    pub matrix: [f32; 16],
    pub intensity: f32,
}

impl ColorMatrix {
    pub fn new(matrix: [f32; 16]) -> Self {
        Self {
            matrix,
            intensity: 1.0,
        }
    }

    pub fn sepia() -> Self {
        Self::new(SEPIA_MATRIX)
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        let mut identity = [0.0; 16];
        for i in 0..4 {
            identity[i * 5] = 1.0;
        }
        Self::new(identity)
    }
}

pixel_unit!(ColorMatrix, "ColorMatrix", |unit, c| {
    let m = &unit.matrix;
    let mut out = [0.0f32; 4];
    for (row, value) in out.iter_mut().enumerate() {
        *value = (0..4).map(|col| m[row * 4 + col] * c[col]).sum();
    }
    [
        mix(c[0], out[0], unit.intensity),
        mix(c[1], out[1], unit.intensity),
        mix(c[2], out[2], unit.intensity),
        mix(c[3], out[3], unit.intensity),
    ]
});

/// Remaps color through a 512x512 lookup image of 8x8 tiles, 64 blue levels.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub table: Arc<RgbaImage>,
    pub intensity: f32,
}

impl Lookup {
    /// Edge length a lookup image must have.
    pub const TABLE_SIZE: u32 = 512;

    pub fn new(table: Arc<RgbaImage>) -> Self {
        Self {
            table,
            intensity: 1.0,
        }
    }

    fn tile_coords(&self, blue_level: f32, c: &[f32; 4]) -> (f32, f32) {
        let tile_y = (blue_level / 8.0).floor();
        let tile_x = blue_level - tile_y * 8.0;
        let texel = 1.0 / Self::TABLE_SIZE as f32;
        (
            tile_x * 0.125 + 0.5 * texel + (0.125 - texel) * c[0],
            tile_y * 0.125 + 0.5 * texel + (0.125 - texel) * c[1],
        )
    }
}

impl Operation for Lookup {
    fn name(&self) -> &'static str {
        "Lookup"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        if self.table.dimensions() != (Self::TABLE_SIZE, Self::TABLE_SIZE) {
            return Err(OperationError::Failed {
                operation: "Lookup",
                reason: format!(
                    "lookup table must be {size}x{size}, got {}x{}",
                    self.table.width(),
                    self.table.height(),
                    size = Self::TABLE_SIZE
                ),
            });
        }

        Ok(map_pixels(image, |c| {
            let blue = c[2].clamp(0.0, 1.0) * 63.0;
            let (x1, y1) = self.tile_coords(blue.floor(), &c);
            let (x2, y2) = self.tile_coords(blue.ceil(), &c);
            let first = sample_normalized(&self.table, x1, y1);
            let second = sample_normalized(&self.table, x2, y2);
            let t = blue.fract();
            let mapped = [
                mix(first[0], second[0], t),
                mix(first[1], second[1], t),
                mix(first[2], second[2], t),
            ];
            [
                mix(c[0], mapped[0], self.intensity),
                mix(c[1], mapped[1], self.intensity),
                mix(c[2], mapped[2], self.intensity),
                c[3],
            ]
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColorInversion;

pixel_unit!(ColorInversion, "ColorInversion", |_unit, c| {
    [1.0 - c[0], 1.0 - c[1], 1.0 - c[2], c[3]]
});

/// Overlay-blends the luminance with a tint color.
#[derive(Debug, Clone)]
pub struct Monochrome {
    pub intensity: f32,
    pub color: Color,
}

impl Default for Monochrome {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            color: Color::rgb(0.6, 0.45, 0.3),
        }
    }
}

pixel_unit!(Monochrome, "Monochrome", |unit, c| {
    let l = luminance(&c);
    let tint = unit.color.to_array();
    let overlay = |f: f32| {
        if l < 0.5 {
            2.0 * l * f
        } else {
            1.0 - 2.0 * (1.0 - l) * (1.0 - f)
        }
    };
    [
        mix(c[0], overlay(tint[0]), unit.intensity),
        mix(c[1], overlay(tint[1]), unit.intensity),
        mix(c[2], overlay(tint[2]), unit.intensity),
        c[3],
    ]
});

/// Maps luminance onto a gradient between two colors.
#[derive(Debug, Clone)]
pub struct FalseColor {
    pub first: Color,
    pub second: Color,
}

impl Default for FalseColor {
    fn default() -> Self {
        Self {
            first: Color::rgb(0.0, 0.0, 0.5),
            second: Color::RED,
        }
    }
}

pixel_unit!(FalseColor, "FalseColor", |unit, c| {
    let l = luminance(&c);
    [
        mix(unit.first.r, unit.second.r, l),
        mix(unit.first.g, unit.second.g, l),
        mix(unit.first.b, unit.second.b, l),
        c[3],
    ]
});

/// Adds or removes a vertical haze gradient.
#[derive(Debug, Clone)]
pub struct Haze {
    pub distance: f32,
    pub slope: f32,
}

impl Default for Haze {
    fn default() -> Self {
        Self {
            distance: 0.2,
            slope: 0.0,
        }
    }
}

impl Operation for Haze {
    fn name(&self) -> &'static str {
        "Haze"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        Ok(map_pixels_at(image, |_u, v, c| {
            let d = v * self.slope + self.distance;
            let denominator = 1.0 - d;
            if denominator.abs() < f32::EPSILON {
                return [1.0, 1.0, 1.0, c[3]];
            }
            [
                (c[0] - d) / denominator,
                (c[1] - d) / denominator,
                (c[2] - d) / denominator,
                c[3],
            ]
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Opacity {
    pub opacity: f32,
}

impl Default for Opacity {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

pixel_unit!(Opacity, "Opacity", |unit, c| {
    [c[0], c[1], c[2], c[3] * unit.opacity]
});

/// White where luminance reaches the threshold, black elsewhere.
#[derive(Debug, Clone)]
pub struct LuminanceThreshold {
    pub threshold: f32,
}

impl Default for LuminanceThreshold {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

pixel_unit!(LuminanceThreshold, "LuminanceThreshold", |unit, c| {
    let v = if luminance(&c) >= unit.threshold { 1.0 } else { 0.0 };
    [v, v, v, c[3]]
});

/// Boosts the saturation of muted colors more than saturated ones.
#[derive(Debug, Clone, Default)]
pub struct Vibrance {
    pub vibrance: f32,
}

pixel_unit!(Vibrance, "Vibrance", |unit, c| {
    let average = (c[0] + c[1] + c[2]) / 3.0;
    let max = c[0].max(c[1]).max(c[2]);
    let amount = (max - average) * (-unit.vibrance * 3.0);
    [
        mix(c[0], max, amount),
        mix(c[1], max, amount),
        mix(c[2], max, amount),
        c[3],
    ]
});

/// Makes pixels close to a key color transparent.
#[derive(Debug, Clone)]
pub struct ChromaKeying {
    pub threshold_sensitivity: f32,
    pub smoothing: f32,
    pub color: Color,
}

impl Default for ChromaKeying {
    fn default() -> Self {
        Self {
            threshold_sensitivity: 0.4,
            smoothing: 0.1,
            color: Color::GREEN,
        }
    }
}

/// Chroma components (Cr, Cb) of a color.
pub(crate) fn chroma(r: f32, g: f32, b: f32) -> (f32, f32) {
    let y = 0.2989 * r + 0.5866 * g + 0.1145 * b;
    (0.7132 * (r - y), 0.5647 * (b - y))
}

pixel_unit!(ChromaKeying, "ChromaKeying", |unit, c| {
    let (key_cr, key_cb) = chroma(unit.color.r, unit.color.g, unit.color.b);
    let (cr, cb) = chroma(c[0], c[1], c[2]);
    let distance = ((cr - key_cr).powi(2) + (cb - key_cb).powi(2)).sqrt();
    let keep = smoothstep(
        unit.threshold_sensitivity,
        unit.threshold_sensitivity + unit.smoothing,
        distance,
    );
    [c[0], c[1], c[2], c[3] * keep]
});

/// Input and output levels per channel, with a gamma midpoint.
#[derive(Debug, Clone)]
pub struct Levels {
    pub minimum: Color,
    pub middle: Color,
    pub maximum: Color,
    pub min_output: Color,
    pub max_output: Color,
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            minimum: Color::BLACK,
            middle: Color::WHITE,
            maximum: Color::WHITE,
            min_output: Color::BLACK,
            max_output: Color::WHITE,
        }
    }
}

pixel_unit!(Levels, "Levels", |unit, c| {
    let level = |v: f32, lo: f32, mid: f32, hi: f32, out_lo: f32, out_hi: f32| {
        let span = (hi - lo).max(f32::EPSILON);
        let t = ((v - lo).max(0.0) / span).min(1.0);
        let t = if mid > 0.0 { t.powf(1.0 / mid) } else { t };
        mix(out_lo, out_hi, t)
    };
    let (lo, mid, hi) = (unit.minimum, unit.middle, unit.maximum);
    let (out_lo, out_hi) = (unit.min_output, unit.max_output);
    [
        level(c[0], lo.r, mid.r, hi.r, out_lo.r, out_hi.r),
        level(c[1], lo.g, mid.g, hi.g, out_lo.g, out_hi.g),
        level(c[2], lo.b, mid.b, hi.b, out_lo.b, out_hi.b),
        c[3],
    ]
});

/// Color temperature and green-magenta tint.
#[derive(Debug, Clone)]
pub struct WhiteBalance {
    /// Kelvin. 5000 is neutral.
    pub temperature: f32,
    pub tint: f32,
}

impl Default for WhiteBalance {
    fn default() -> Self {
        Self {
            temperature: 5000.0,
            tint: 0.0,
        }
    }
}

impl WhiteBalance {
    const WARM: [f32; 3] = [0.93, 0.54, 0.0];

    fn warmth(&self) -> f32 {
        let offset = self.temperature - 5000.0;
        if offset < 0.0 {
            0.0004 * offset
        } else {
            0.00006 * offset
        }
    }
}

pixel_unit!(WhiteBalance, "WhiteBalance", |unit, c| {
    // Tint shifts Q in YIQ space.
    let y = 0.299 * c[0] + 0.587 * c[1] + 0.114 * c[2];
    let i = 0.596 * c[0] - 0.274 * c[1] - 0.322 * c[2];
    let q = (0.212 * c[0] - 0.523 * c[1] + 0.311 * c[2] + unit.tint * 0.05226)
        .clamp(-0.5226, 0.5226);
    let rgb = [
        y + 0.956 * i + 0.621 * q,
        y - 0.272 * i - 0.647 * q,
        y - 1.105 * i + 1.702 * q,
    ];

    let t = unit.warmth();
    let warm = |v: f32, w: f32| {
        let overlaid = if v < 0.5 {
            2.0 * v * w
        } else {
            1.0 - 2.0 * (1.0 - v) * (1.0 - w)
        };
        mix(v, overlaid, t)
    };
    [
        warm(rgb[0], WhiteBalance::WARM[0]),
        warm(rgb[1], WhiteBalance::WARM[1]),
        warm(rgb[2], WhiteBalance::WARM[2]),
        c[3],
    ]
});

/// Lifts shadows and pulls down highlights.
#[derive(Debug, Clone)]
pub struct HighlightsAndShadows {
    /// `0.0` leaves shadows alone, `1.0` lightens them most.
    pub shadows: f32,
    /// `1.0` leaves highlights alone, `0.0` darkens them most.
    pub highlights: f32,
}

impl Default for HighlightsAndShadows {
    fn default() -> Self {
        Self {
            shadows: 0.0,
            highlights: 1.0,
        }
    }
}

pixel_unit!(HighlightsAndShadows, "HighlightsAndShadows", |unit, c| {
    let l = luminance(&c);
    if l <= f32::EPSILON {
        return c;
    }
    let s = 1.0 / (unit.shadows + 1.0);
    let shadow = (l.powf(s) - 0.76 * l.powf(2.0 * s) - l).clamp(0.0, 1.0);
    let h = 1.0 / (2.0 - unit.highlights).max(f32::EPSILON);
    let highlight =
        (1.0 - ((1.0 - l).powf(h) - 0.8 * (1.0 - l).powf(2.0 * h)) - l).clamp(-1.0, 0.0);
    let k = (l + shadow + highlight) / l;
    [c[0] * k, c[1] * k, c[2] * k, c[3]]
});

/// Tints shadows and highlights toward two colors.
#[derive(Debug, Clone)]
pub struct HighlightAndShadowTint {
    pub shadow_tint_color: Color,
    pub shadow_tint_intensity: f32,
    pub highlight_tint_color: Color,
    pub highlight_tint_intensity: f32,
}

impl Default for HighlightAndShadowTint {
    fn default() -> Self {
        Self {
            shadow_tint_color: Color::RED,
            shadow_tint_intensity: 0.0,
            highlight_tint_color: Color::BLUE,
            highlight_tint_intensity: 0.0,
        }
    }
}

pixel_unit!(HighlightAndShadowTint, "HighlightAndShadowTint", |unit, c| {
    let l = luminance(&c);
    let shadow_tint = unit.shadow_tint_color.to_array();
    let highlight_tint = unit.highlight_tint_color.to_array();
    let mut out = [0.0f32; 4];
    for ch in 0..4 {
        let shadowed = mix(
            c[ch],
            c[ch].max(mix(shadow_tint[ch], c[ch], l)),
            unit.shadow_tint_intensity,
        );
        let highlighted = mix(
            c[ch],
            shadowed.min(mix(shadowed, highlight_tint[ch], l)),
            unit.highlight_tint_intensity,
        );
        out[ch] = mix(shadowed, highlighted, l);
    }
    out
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Size;
    use image::Rgba;

    fn frame(color: Color) -> Frame {
        Frame::solid(Size::new(2, 2), color, 1)
    }

    fn render_one(unit: &mut dyn Operation, color: Color) -> Rgba<u8> {
        *unit.render(&[frame(color)]).unwrap().get_pixel(0, 0)
    }

    #[test]
    fn test_brightness() {
        let gray = Color::rgb(0.5, 0.5, 0.5);
        assert_eq!(render_one(&mut Brightness::new(0.0), gray), Rgba([128, 128, 128, 255]));
        assert_eq!(render_one(&mut Brightness::new(1.0), gray), Rgba([255, 255, 255, 255]));
        assert_eq!(render_one(&mut Brightness::new(-1.0), gray), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_requires_one_input() {
        let mut unit = ColorInversion;
        assert!(matches!(
            unit.render(&[]),
            Err(OperationError::InputCount { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_identity_defaults() {
        let color = Color::rgb(0.2, 0.4, 0.6);
        let expected = color.to_rgba8();
        assert_eq!(render_one(&mut Contrast::default(), color), expected);
        assert_eq!(render_one(&mut Saturation::default(), color), expected);
        assert_eq!(render_one(&mut Gamma::default(), color), expected);
        assert_eq!(render_one(&mut ColorMatrix::default(), color), expected);
        assert_eq!(render_one(&mut Exposure::default(), color), expected);
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        let out = render_one(&mut Saturation { saturation: 0.0 }, Color::RED);
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn test_inversion_and_threshold() {
        assert_eq!(render_one(&mut ColorInversion, Color::RED), Rgba([0, 255, 255, 255]));
        let mut threshold = LuminanceThreshold::default();
        assert_eq!(render_one(&mut threshold, Color::WHITE), Rgba([255, 255, 255, 255]));
        assert_eq!(render_one(&mut threshold, Color::rgb(0.1, 0.1, 0.1)), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_chroma_key_removes_key_color() {
        let mut unit = ChromaKeying::default();
        assert_eq!(render_one(&mut unit, Color::GREEN)[3], 0);
        assert_eq!(render_one(&mut unit, Color::RED)[3], 255);
    }

    #[test]
    fn test_lookup_rejects_wrong_table_size() {
        let mut unit = Lookup::new(Arc::new(RgbaImage::new(64, 64)));
        assert!(matches!(
            unit.render(&[frame(Color::WHITE)]),
            Err(OperationError::Failed { .. })
        ));
    }

    #[test]
    fn test_lookup_identity_table() {
        // Identity table: each tile encodes (r, g) in its position and b by tile index.
        let table = RgbaImage::from_fn(512, 512, |x, y| {
            let tile = (y / 64) * 8 + x / 64;
            let r = (x % 64) as f32 / 63.0;
            let g = (y % 64) as f32 / 63.0;
            let b = tile as f32 / 63.0;
            Rgba([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8, 255])
        });
        let mut unit = Lookup::new(Arc::new(table));
        let out = render_one(&mut unit, Color::rgb(0.0, 0.0, 1.0));
        assert!(out[0] < 8);
        assert!(out[2] > 247);
    }

    #[test]
    fn test_hue_full_turn() {
        let color = Color::rgb(0.8, 0.3, 0.1);
        let out = render_one(&mut Hue { hue: 360.0 }, color);
        let expected = color.to_rgba8();
        for c in 0..3 {
            assert!((out[c] as i32 - expected[c] as i32).abs() <= 2);
        }
    }

    #[test]
    fn test_new_adjustments_have_neutral_defaults() {
        let color = Color::rgb(0.2, 0.4, 0.6);
        let expected = color.to_rgba8();
        let close = |out: Rgba<u8>| (0..3).all(|c| (out[c] as i32 - expected[c] as i32).abs() <= 2);
        assert!(close(render_one(&mut Levels::default(), color)));
        assert!(close(render_one(&mut WhiteBalance::default(), color)));
        assert!(close(render_one(&mut HighlightsAndShadows::default(), color)));
        assert!(close(render_one(&mut HighlightAndShadowTint::default(), color)));
    }

    #[test]
    fn test_levels_output_floor() {
        let mut unit = Levels {
            minimum: Color::rgb(0.5, 0.0, 0.0),
            min_output: Color::rgb(0.5, 0.0, 0.0),
            ..Levels::default()
        };
        // Red below the input minimum lands on the output minimum.
        assert_eq!(render_one(&mut unit, Color::rgb(0.2, 0.0, 0.0))[0], 128);
    }

    #[test]
    fn test_white_balance_warms() {
        let gray = Color::rgb(0.5, 0.5, 0.5);
        let warm = render_one(
            &mut WhiteBalance {
                temperature: 7000.0,
                tint: 0.0,
            },
            gray,
        );
        assert!(warm[0] > warm[2]);
    }

    #[test]
    fn test_shadows_lift_dark_pixels() {
        let dark = Color::rgb(0.1, 0.1, 0.1);
        let before = render_one(&mut HighlightsAndShadows::default(), dark);
        let after = render_one(
            &mut HighlightsAndShadows {
                shadows: 1.0,
                highlights: 1.0,
            },
            dark,
        );
        assert!(after[0] > before[0]);
    }

    #[test]
    fn test_opacity() {
        assert_eq!(render_one(&mut Opacity { opacity: 0.0 }, Color::RED)[3], 0);
    }
}
