//! Stylized visual effects.

use crate::core::error::OperationError;
use crate::core::types::{Color, Frame, Position};
use crate::engine::Operation;
use crate::operations::pixel::{
    convolve3x3, from_unit, luminance, map_pixels, map_pixels_at, mix, non_empty_input, pack_rgba,
    sample_clamped, sample_normalized, single_input, smoothstep, to_unit,
};
use crate::operations::processing::{EdgeDetection, GaussianBlur, ThresholdEdgeDetection};
use image::{Rgba, RgbaImage};

/// Replaces each block of pixels with the color at its center.
#[derive(Debug, Clone)]
pub struct Pixellate {
    /// Block width as a fraction of the frame width.
    pub fraction: f32,
}

impl Default for Pixellate {
    fn default() -> Self {
        Self { fraction: 0.05 }
    }
}

impl Operation for Pixellate {
    fn name(&self) -> &'static str {
        "Pixellate"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let block = (self.fraction.max(0.0) * image.width() as f32).round() as u32;
        if block <= 1 {
            return Ok(image.clone());
        }
        let (width, height) = image.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let cx = ((x / block) * block + block / 2).min(width - 1);
            let cy = ((y / block) * block + block / 2).min(height - 1);
            *image.get_pixel(cx, cy)
        }))
    }
}

/// Quantizes each channel to a number of levels.
#[derive(Debug, Clone)]
pub struct Posterize {
    pub levels: f32,
}

impl Default for Posterize {
    fn default() -> Self {
        Self { levels: 10.0 }
    }
}

impl Operation for Posterize {
    fn name(&self) -> &'static str {
        "Posterize"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        let levels = self.levels.max(1.0);
        Ok(map_pixels(image, |c| {
            let q = |v: f32| (v * levels + 0.5).floor() / levels;
            [q(c[0]), q(c[1]), q(c[2]), c[3]]
        }))
    }
}

/// Inverts pixels whose luminance is above the threshold.
#[derive(Debug, Clone)]
pub struct Solarize {
    pub threshold: f32,
}

impl Default for Solarize {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl Operation for Solarize {
    fn name(&self) -> &'static str {
        "Solarize"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        Ok(map_pixels(image, |c| {
            if luminance(&c) < self.threshold {
                c
            } else {
                [1.0 - c[0], 1.0 - c[1], 1.0 - c[2], c[3]]
            }
        }))
    }
}

/// Fades toward a color away from the center.
#[derive(Debug, Clone)]
pub struct Vignette {
    pub center: Position,
    pub color: Color,
    /// Distance where the fade starts.
    pub start: f32,
    /// Distance where the fade is complete.
    pub end: f32,
}

impl Default for Vignette {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            color: Color::BLACK,
            start: 0.3,
            end: 0.75,
        }
    }
}

impl Operation for Vignette {
    fn name(&self) -> &'static str {
        "Vignette"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        Ok(map_pixels_at(image, |u, v, c| {
            let d = ((u - self.center.x).powi(2) + (v - self.center.y).powi(2)).sqrt();
            let t = smoothstep(self.start, self.end, d);
            [
                mix(c[0], self.color.r, t),
                mix(c[1], self.color.g, t),
                mix(c[2], self.color.b, t),
                c[3],
            ]
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Emboss {
    pub intensity: f32,
}

impl Default for Emboss {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

impl Operation for Emboss {
    fn name(&self) -> &'static str {
        "Emboss"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let i = self.intensity;
        let kernel = [-2.0 * i, -i, 0.0, -i, 1.0, i, 0.0, i, 2.0 * i];
        Ok(convolve3x3(image, &kernel))
    }
}

/// Twists the frame around a center point.
#[derive(Debug, Clone)]
pub struct Swirl {
    pub center: Position,
    /// Normalized radius of the affected disc.
    pub radius: f32,
    /// Twist at the center, in radians divided by 8.
    pub angle: f32,
}

impl Default for Swirl {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.5,
            angle: 1.0,
        }
    }
}

impl Operation for Swirl {
    fn name(&self) -> &'static str {
        "Swirl"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        let mut result = RgbaImage::new(width, height);

        for (x, y, out) in result.enumerate_pixels_mut() {
            let u = (x as f32 + 0.5) / width as f32 - self.center.x;
            let v = (y as f32 + 0.5) / height as f32 - self.center.y;
            let dist = (u * u + v * v).sqrt();

            let (su, sv) = if dist < self.radius && self.radius > 0.0 {
                let percent = (self.radius - dist) / self.radius;
                let theta = percent * percent * self.angle * 8.0;
                let (s, c) = theta.sin_cos();
                (u * c - v * s, u * s + v * c)
            } else {
                (u, v)
            };

            let color = sample_normalized(image, su + self.center.x, sv + self.center.y);
            *out = pack_rgba(color);
        }
        Ok(result)
    }
}

/// Dark edges on white, like a pencil sketch.
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    pub edges: EdgeDetection,
}

impl Operation for Sketch {
    fn name(&self) -> &'static str {
        "Sketch"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let magnitudes = self.edges.magnitudes(image);
        let (width, height) = image.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let v = from_unit(1.0 - magnitudes[(y * width + x) as usize]);
            Rgba([v, v, v, image.get_pixel(x, y)[3]])
        }))
    }
}

/// Four-color CGA palette on a coarse pixel grid.
#[derive(Debug, Clone, Default)]
pub struct CgaColorspace;

impl CgaColorspace {
    const GRID: (f32, f32) = (320.0, 200.0);
    const PALETTE: [[f32; 3]; 4] = [
        [0.0, 0.0, 0.0],
        [0.333, 1.0, 1.0],
        [1.0, 0.333, 1.0],
        [1.0, 1.0, 1.0],
    ];

    fn nearest(color: [f32; 4]) -> [f32; 4] {
        let distance = |p: &[f32; 3]| {
            (0..3).map(|c| (p[c] - color[c]).powi(2)).sum::<f32>()
        };
        let mut best = Self::PALETTE[0];
        for candidate in &Self::PALETTE[1..] {
            if distance(candidate) < distance(&best) {
                best = *candidate;
            }
        }
        [best[0], best[1], best[2], color[3]]
    }
}

impl Operation for CgaColorspace {
    fn name(&self) -> &'static str {
        "CgaColorspace"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (gx, gy) = Self::GRID;
        Ok(map_pixels_at(image, |u, v, _| {
            let su = ((u * gx).floor() + 0.5) / gx;
            let sv = ((v * gy).floor() + 0.5) / gy;
            Self::nearest(sample_normalized(image, su, sv))
        }))
    }
}

/// Pixellates in polar coordinates around a center.
#[derive(Debug, Clone)]
pub struct PolarPixellate {
    pub center: Position,
    /// Radial step, and angular step as a fraction of a full turn.
    pub pixel_size: (f32, f32),
}

impl Default for PolarPixellate {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            pixel_size: (0.05, 0.05),
        }
    }
}

impl Operation for PolarPixellate {
    fn name(&self) -> &'static str {
        "PolarPixellate"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let radial = self.pixel_size.0.max(f32::EPSILON);
        let angular = self.pixel_size.1.max(f32::EPSILON) * std::f32::consts::TAU;
        Ok(map_pixels_at(image, |u, v, _| {
            let (du, dv) = (u - self.center.x, v - self.center.y);
            let r = ((du * du + dv * dv).sqrt() / radial).floor() * radial + radial / 2.0;
            let phi = (dv.atan2(du) / angular).floor() * angular + angular / 2.0;
            let (s, c) = phi.sin_cos();
            sample_normalized(image, self.center.x + r * c, self.center.y + r * s)
        }))
    }
}

/// Center color of each cell, drawn as a dot on black.
#[derive(Debug, Clone)]
pub struct PolkaDot {
    /// Cell width as a fraction of the frame width.
    pub fraction: f32,
    /// Dot diameter relative to the cell.
    pub dot_scaling: f32,
}

impl Default for PolkaDot {
    fn default() -> Self {
        Self {
            fraction: 0.05,
            dot_scaling: 0.9,
        }
    }
}

/// Cell geometry shared by the dot effects: the cell center and the pixel's
/// distance to it, both in pixels.
fn cell(x: u32, y: u32, block: u32, width: u32, height: u32) -> ((u32, u32), f32) {
    let cx = ((x / block) * block + block / 2).min(width - 1);
    let cy = ((y / block) * block + block / 2).min(height - 1);
    let dx = x as f32 + 0.5 - ((x / block) * block) as f32 - block as f32 / 2.0;
    let dy = y as f32 + 0.5 - ((y / block) * block) as f32 - block as f32 / 2.0;
    ((cx, cy), (dx * dx + dy * dy).sqrt())
}

fn block_size(fraction: f32, width: u32) -> u32 {
    ((fraction.max(0.0) * width as f32).round() as u32).max(1)
}

impl Operation for PolkaDot {
    fn name(&self) -> &'static str {
        "PolkaDot"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        let block = block_size(self.fraction, width);
        let radius = block as f32 * self.dot_scaling / 2.0;
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let ((cx, cy), distance) = cell(x, y, block, width, height);
            let center = *image.get_pixel(cx, cy);
            if distance <= radius {
                center
            } else {
                Rgba([0, 0, 0, center[3]])
            }
        }))
    }
}

/// Black dots on white, sized by the darkness of each cell.
#[derive(Debug, Clone)]
pub struct Halftone {
    pub fraction: f32,
}

impl Default for Halftone {
    fn default() -> Self {
        Self { fraction: 0.01 }
    }
}

impl Operation for Halftone {
    fn name(&self) -> &'static str {
        "Halftone"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        let block = block_size(self.fraction, width);
        let max_radius = block as f32 * std::f32::consts::FRAC_1_SQRT_2;
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let ((cx, cy), distance) = cell(x, y, block, width, height);
            let p = image.get_pixel(cx, cy);
            let l = luminance(&[to_unit(p[0]), to_unit(p[1]), to_unit(p[2]), 1.0]);
            let v = if distance < (1.0 - l) * max_radius { 0 } else { 255 };
            Rgba([v, v, v, p[3]])
        }))
    }
}

/// Diagonal hatching whose density follows the darkness of the frame.
#[derive(Debug, Clone)]
pub struct Crosshatch {
    /// Line spacing, normalized.
    pub spacing: f32,
    pub line_width: f32,
}

impl Default for Crosshatch {
    fn default() -> Self {
        Self {
            spacing: 0.03,
            line_width: 0.003,
        }
    }
}

impl Operation for Crosshatch {
    fn name(&self) -> &'static str {
        "Crosshatch"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        let spacing = self.spacing.max(0.001);
        let width = self.line_width;
        Ok(map_pixels_at(image, |u, v, c| {
            let l = luminance(&c);
            let on = |offset: f32, sum: bool| {
                let t = if sum { u + v } else { u - v };
                (t - offset).rem_euclid(spacing) <= width
            };
            let dark = (l < 0.999 && on(0.0, true))
                || (l < 0.75 && on(0.0, false))
                || (l < 0.5 && on(spacing / 2.0, true))
                || (l < 0.3 && on(spacing / 2.0, false));
            let v = if dark { 0.0 } else { 1.0 };
            [v, v, v, c[3]]
        }))
    }
}

/// Black edges on white, only where the edge magnitude crosses a threshold.
#[derive(Debug, Clone, Default)]
pub struct ThresholdSketch {
    pub edges: ThresholdEdgeDetection,
}

impl Operation for ThresholdSketch {
    fn name(&self) -> &'static str {
        "ThresholdSketch"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let mut edges = self.edges.render(inputs)?;
        for pixel in edges.pixels_mut() {
            let v = 255 - pixel[0];
            *pixel = Rgba([v, v, v, 255]);
        }
        Ok(edges)
    }
}

/// Black outlines over a posterized frame.
#[derive(Debug, Clone)]
pub struct Toon {
    pub edges: EdgeDetection,
    pub threshold: f32,
    pub quantization_levels: f32,
}

impl Default for Toon {
    fn default() -> Self {
        Self {
            edges: EdgeDetection::sobel(),
            threshold: 0.2,
            quantization_levels: 10.0,
        }
    }
}

impl Toon {
    fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let magnitudes = self.edges.magnitudes(image);
        let levels = self.quantization_levels.max(1.0);
        let width = image.width();
        let mut result = image.clone();
        for (x, y, pixel) in result.enumerate_pixels_mut() {
            if magnitudes[(y * width + x) as usize] > self.threshold {
                *pixel = Rgba([0, 0, 0, pixel[3]]);
            } else {
                for c in 0..3 {
                    let q = (to_unit(pixel[c]) * levels + 0.5).floor() / levels;
                    pixel[c] = from_unit(q);
                }
            }
        }
        result
    }
}

impl Operation for Toon {
    fn name(&self) -> &'static str {
        "Toon"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        Ok(self.apply(image))
    }
}

/// Toon on a pre-blurred frame, which suppresses noisy outlines.
#[derive(Debug, Clone)]
pub struct SmoothToon {
    pub blur: GaussianBlur,
    pub toon: Toon,
}

impl Default for SmoothToon {
    fn default() -> Self {
        Self {
            blur: GaussianBlur::new(0.5),
            toon: Toon::default(),
        }
    }
}

impl Operation for SmoothToon {
    fn name(&self) -> &'static str {
        "SmoothToon"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        Ok(self.toon.apply(&self.blur.apply(image)))
    }
}

/// Remaps each output pixel to a source position and samples there.
fn warp(image: &RgbaImage, f: impl Fn(f32, f32) -> (f32, f32)) -> RgbaImage {
    map_pixels_at(image, |u, v, _| {
        let (su, sv) = f(u, v);
        sample_normalized(image, su, sv)
    })
}

/// Magnifies (positive scale) or shrinks a disc around the center.
#[derive(Debug, Clone)]
pub struct Bulge {
    pub center: Position,
    pub radius: f32,
    /// `-1.0..=1.0`
    pub scale: f32,
}

impl Default for Bulge {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.25,
            scale: 0.5,
        }
    }
}

impl Operation for Bulge {
    fn name(&self) -> &'static str {
        "BulgeDistortion"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let Position { x: cx, y: cy } = self.center;
        Ok(warp(image, |u, v| {
            let (du, dv) = (u - cx, v - cy);
            let dist = (du * du + dv * dv).sqrt();
            if dist < self.radius {
                let percent = 1.0 - (self.radius - dist) / self.radius * self.scale;
                let percent = percent * percent;
                (cx + du * percent, cy + dv * percent)
            } else {
                (u, v)
            }
        }))
    }
}

/// Pulls the frame toward (positive scale) or away from the center.
#[derive(Debug, Clone)]
pub struct Pinch {
    pub center: Position,
    pub radius: f32,
    pub scale: f32,
}

impl Default for Pinch {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 1.0,
            scale: 0.5,
        }
    }
}

impl Operation for Pinch {
    fn name(&self) -> &'static str {
        "PinchDistortion"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let Position { x: cx, y: cy } = self.center;
        Ok(warp(image, |u, v| {
            let (du, dv) = (u - cx, v - cy);
            let dist = (du * du + dv * dv).sqrt();
            if dist < self.radius {
                let percent = 1.0 + (0.5 - dist) / 0.5 * self.scale;
                (cx + du * percent, cy + dv * percent)
            } else {
                (u, v)
            }
        }))
    }
}

/// Stretches the frame outward from a center point.
#[derive(Debug, Clone)]
pub struct Stretch {
    pub center: Position,
}

impl Default for Stretch {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
        }
    }
}

impl Operation for Stretch {
    fn name(&self) -> &'static str {
        "StretchDistortion"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let Position { x: cx, y: cy } = self.center;
        let stretch = |t: f32, c: f32| {
            let centered = 2.0 * t - 1.0 - (2.0 * c - 1.0);
            let magnitude = centered.abs();
            let magnitude = 0.5 * magnitude + 0.5 * smoothstep(0.25, 0.5, magnitude) * magnitude;
            (centered.signum() * magnitude + 2.0 * c - 1.0) / 2.0 + 0.5
        };
        Ok(warp(image, |u, v| (stretch(u, cx), stretch(v, cy))))
    }
}

/// The frame seen through a refracting sphere. Outside the sphere is
/// transparent black.
#[derive(Debug, Clone)]
pub struct SphereRefraction {
    pub center: Position,
    pub radius: f32,
    pub refractive_index: f32,
    /// Inverts the refraction and adds a rim highlight.
    pub glass: bool,
}

impl Default for SphereRefraction {
    fn default() -> Self {
        Self {
            center: Position::CENTER,
            radius: 0.25,
            refractive_index: 0.71,
            glass: false,
        }
    }
}

impl SphereRefraction {
    pub fn glass() -> Self {
        Self {
            glass: true,
            ..Self::default()
        }
    }
}

/// Refracts the view ray `(0, 0, -1)` through `normal`. Total internal
/// reflection yields the zero vector.
fn refract(normal: [f32; 3], eta: f32) -> [f32; 3] {
    let incident = [0.0, 0.0, -1.0];
    let d = normal[2] * incident[2];
    let k = 1.0 - eta * eta * (1.0 - d * d);
    if k < 0.0 {
        return [0.0; 3];
    }
    let t = eta * d + k.sqrt();
    [
        eta * incident[0] - t * normal[0],
        eta * incident[1] - t * normal[1],
        eta * incident[2] - t * normal[2],
    ]
}

impl Operation for SphereRefraction {
    fn name(&self) -> &'static str {
        if self.glass {
            "GlassSphereRefraction"
        } else {
            "SphereRefraction"
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let radius = self.radius.max(f32::EPSILON);
        Ok(map_pixels_at(image, |u, v, _| {
            let (du, dv) = (u - self.center.x, v - self.center.y);
            let dist = (du * du + dv * dv).sqrt();
            if dist > radius {
                return [0.0; 4];
            }
            let depth = radius * (1.0 - (dist / radius).powi(2)).max(0.0).sqrt();
            let length = (du * du + dv * dv + depth * depth).sqrt().max(f32::EPSILON);
            let normal = [du / length, dv / length, depth / length];
            let mut ray = refract(normal, self.refractive_index);
            if self.glass {
                ray = [-ray[0], -ray[1], -ray[2]];
            }
            let mut color = sample_normalized(image, (ray[0] + 1.0) * 0.5, (ray[1] + 1.0) * 0.5);
            if self.glass {
                let rim = smoothstep(0.9, 1.0, dist / radius) * 0.5;
                for c in color.iter_mut().take(3) {
                    *c = (*c + rim).min(1.0);
                }
            }
            color
        }))
    }
}

/// Painterly smoothing: each pixel takes the mean of its least-varied
/// quadrant.
#[derive(Debug, Clone)]
pub struct Kuwahara {
    pub radius: u32,
}

impl Default for Kuwahara {
    fn default() -> Self {
        Self { radius: 3 }
    }
}

impl Operation for Kuwahara {
    fn name(&self) -> &'static str {
        "Kuwahara"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        if self.radius == 0 {
            return Ok(image.clone());
        }
        let r = self.radius as i64;
        let quadrants = [(-r, 0, -r, 0), (0, r, -r, 0), (-r, 0, 0, r), (0, r, 0, r)];
        let mut result = image.clone();
        for (x, y, out) in result.enumerate_pixels_mut() {
            let mut best = ([0.0f32; 3], f32::INFINITY);
            for &(x0, x1, y0, y1) in &quadrants {
                let mut sum = [0.0f32; 3];
                let mut squares = [0.0f32; 3];
                let mut n = 0.0;
                for dy in y0..=y1 {
                    for dx in x0..=x1 {
                        let p = sample_clamped(image, x as i64 + dx, y as i64 + dy);
                        for c in 0..3 {
                            let value = to_unit(p[c]);
                            sum[c] += value;
                            squares[c] += value * value;
                        }
                        n += 1.0;
                    }
                }
                let mean = [sum[0] / n, sum[1] / n, sum[2] / n];
                let variance: f32 = (0..3).map(|c| (squares[c] / n - mean[c] * mean[c]).abs()).sum();
                if variance < best.1 {
                    best = (mean, variance);
                }
            }
            out[0] = from_unit(best.0[0]);
            out[1] = from_unit(best.0[1]);
            out[2] = from_unit(best.0[2]);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Size;

    fn gradient() -> Frame {
        Frame::new(
            RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255])),
            1,
        )
    }

    #[test]
    fn test_pixellate_blocks() {
        let mut unit = Pixellate { fraction: 0.25 };
        let out = unit.render(&[gradient()]).unwrap();
        assert_eq!(out.get_pixel(0, 0), out.get_pixel(3, 3));
        assert_ne!(out.get_pixel(0, 0), out.get_pixel(4, 0));

        let mut unit = Pixellate { fraction: 0.0 };
        assert_eq!(&unit.render(&[gradient()]).unwrap(), gradient().image());
    }

    #[test]
    fn test_posterize_single_level() {
        let mut unit = Posterize { levels: 1.0 };
        let out = unit.render(&[gradient()]).unwrap();
        assert!(out.pixels().all(|p| (p[0] == 0 || p[0] == 255) && p[2] == 255));
    }

    #[test]
    fn test_solarize() {
        let mut unit = Solarize::default();
        let white = Frame::solid(Size::new(1, 1), Color::WHITE, 1);
        assert_eq!(unit.render(&[white]).unwrap().get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_vignette_darkens_corners() {
        let frame = Frame::solid(Size::new(20, 20), Color::WHITE, 1);
        let out = Vignette::default().render(&[frame]).unwrap();
        assert_eq!(out.get_pixel(10, 10)[0], 255);
        assert!(out.get_pixel(0, 0)[0] < 128);
    }

    #[test]
    fn test_swirl_keeps_outside_disc() {
        let mut unit = Swirl {
            radius: 0.1,
            ..Swirl::default()
        };
        let input = gradient();
        let out = unit.render(&[input.clone()]).unwrap();
        assert_eq!(out.get_pixel(0, 0), input.image().get_pixel(0, 0));
    }

    #[test]
    fn test_sketch_flat_is_white() {
        let frame = Frame::solid(Size::new(6, 6), Color::RED, 1);
        let out = Sketch::default().render(&[frame]).unwrap();
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_polka_dot_blacks_out_cell_corners() {
        let frame = Frame::solid(Size::new(20, 20), Color::WHITE, 1);
        let mut unit = PolkaDot {
            fraction: 0.5,
            dot_scaling: 0.9,
        };
        let out = unit.render(&[frame]).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(5, 5), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_halftone_dot_size_follows_darkness() {
        let mut unit = Halftone { fraction: 0.5 };
        let white = Frame::solid(Size::new(20, 20), Color::WHITE, 1);
        assert!(unit.render(&[white]).unwrap().pixels().all(|p| p[0] == 255));

        let black = Frame::solid(Size::new(20, 20), Color::BLACK, 1);
        assert!(unit.render(&[black]).unwrap().pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_crosshatch_leaves_white_alone() {
        let white = Frame::solid(Size::new(16, 16), Color::WHITE, 1);
        let out = Crosshatch::default().render(&[white]).unwrap();
        assert!(out.pixels().all(|p| p[0] == 255));

        let black = Frame::solid(Size::new(64, 64), Color::BLACK, 1);
        let out = Crosshatch::default().render(&[black]).unwrap();
        assert!(out.pixels().any(|p| p[0] == 0));
    }

    #[test]
    fn test_toon_outlines_edges() {
        let frame = Frame::new(
            RgbaImage::from_fn(12, 12, |x, _| {
                if x < 6 {
                    Rgba([0, 0, 0, 255])
                } else {
                    Rgba([255, 255, 255, 255])
                }
            }),
            1,
        );
        let out = Toon::default().render(&[frame.clone()]).unwrap();
        assert_eq!(out.get_pixel(6, 6)[0], 0);
        assert_eq!(out.get_pixel(11, 6)[0], 255);

        let sketch = ThresholdSketch::default().render(&[frame]).unwrap();
        assert_eq!(sketch.get_pixel(6, 6)[0], 0);
        assert_eq!(sketch.get_pixel(0, 6)[0], 255);
    }

    #[test]
    fn test_distortions_keep_pixels_outside_radius() {
        let input = gradient();
        let corner = *input.image().get_pixel(0, 0);
        let mut bulge = Bulge::default();
        assert_eq!(bulge.render(&[input.clone()]).unwrap().get_pixel(0, 0), &corner);

        let mut pinch = Pinch {
            radius: 0.2,
            ..Pinch::default()
        };
        assert_eq!(pinch.render(&[input.clone()]).unwrap().get_pixel(0, 0), &corner);

        let stretch = Stretch::default().render(&[input.clone()]).unwrap();
        assert_eq!(stretch.dimensions(), (16, 16));
    }

    #[test]
    fn test_sphere_is_transparent_outside() {
        for mut unit in [SphereRefraction::default(), SphereRefraction::glass()] {
            let out = unit.render(&[gradient()]).unwrap();
            assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
            assert_eq!(out.get_pixel(8, 8)[3], 255);
        }
    }

    #[test]
    fn test_kuwahara_flat_and_zero_radius() {
        let flat = Frame::solid(Size::new(8, 8), Color::rgb(0.2, 0.4, 0.6), 1);
        let expected = flat.image().clone();
        assert_eq!(Kuwahara::default().render(&[flat]).unwrap(), expected);

        let input = gradient();
        let out = Kuwahara { radius: 0 }.render(&[input.clone()]).unwrap();
        assert_eq!(&out, input.image());
    }

    #[test]
    fn test_sampling_effects_reject_empty_frames() {
        let empty = Frame::new(RgbaImage::new(0, 0), 1);
        let mut units: Vec<Box<dyn Operation>> = vec![
            Box::new(Pixellate::default()),
            Box::new(PolarPixellate::default()),
            Box::new(PolkaDot::default()),
            Box::new(Halftone::default()),
            Box::new(Sketch::default()),
            Box::new(ThresholdSketch::default()),
            Box::new(Toon::default()),
            Box::new(SmoothToon::default()),
            Box::new(Emboss::default()),
            Box::new(Swirl::default()),
            Box::new(Bulge::default()),
            Box::new(Pinch::default()),
            Box::new(Stretch::default()),
            Box::new(SphereRefraction::default()),
            Box::new(SphereRefraction::glass()),
            Box::new(Kuwahara::default()),
            Box::new(CgaColorspace),
        ];
        for unit in units.iter_mut() {
            let result = unit.render(&[empty.clone()]);
            assert!(
                matches!(result, Err(OperationError::Failed { .. })),
                "{} accepted an empty frame",
                unit.name()
            );
        }
    }

    #[test]
    fn test_cga_uses_palette() {
        let out = CgaColorspace.render(&[gradient()]).unwrap();
        let allowed = [0u8, 85, 255];
        assert!(out.pixels().all(|p| allowed.contains(&p[0]) && allowed.contains(&p[1])));
    }
}
