//! Composite units built from several internal stages.
//!
//! The engine sees each group as a single one-input node; the stages run in
//! sequence inside `render`.

use crate::core::error::OperationError;
use crate::core::types::Frame;
use crate::engine::Operation;
use crate::operations::color::Lookup;
use crate::operations::pixel::{
    from_unit, gray_to_rgba, luminance, map_pixels, map_pixels_at, mix, non_empty_input,
    sample_clamped, smoothstep, to_gray, to_unit, unit_rgba,
};
use crate::operations::processing::{GaussianBlur, Morphology, MorphologyFilter};
use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};
use std::sync::Arc;

/// Sharpens by mixing the frame with a blurred copy of itself.
#[derive(Debug, Clone)]
pub struct UnsharpMask {
    pub blur: GaussianBlur,
    /// 1.0 leaves the image unchanged; higher values sharpen.
    pub intensity: f32,
}

impl Default for UnsharpMask {
    fn default() -> Self {
        Self {
            blur: GaussianBlur::new(4.0),
            intensity: 1.0,
        }
    }
}

impl Operation for UnsharpMask {
    fn name(&self) -> &'static str {
        "UnsharpMask"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let blurred = self.blur.apply(image);
        let k = self.intensity;

        let mut result = image.clone();
        for (x, y, pixel) in result.enumerate_pixels_mut() {
            let soft = blurred.get_pixel(x, y);
            for c in 0..3 {
                let sharp = to_unit(pixel[c]);
                pixel[c] = from_unit(sharp * k + to_unit(soft[c]) * (1.0 - k));
            }
        }
        Ok(result)
    }
}

/// Binarizes luminance against the local mean.
#[derive(Debug, Clone)]
pub struct AdaptiveThreshold {
    /// Half-width of the averaging box.
    pub block_radius: u32,
    /// How far below the local mean a pixel must fall to turn black.
    pub offset: f32,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self {
            block_radius: 4,
            offset: 0.05,
        }
    }
}

impl Operation for AdaptiveThreshold {
    fn name(&self) -> &'static str {
        "AdaptiveThreshold"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let gray = to_gray(image);
        let local = imageproc::filter::box_filter(&gray, self.block_radius, self.block_radius);

        let (width, height) = gray.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let value = to_unit(gray.get_pixel(x, y)[0]);
            let mean = to_unit(local.get_pixel(x, y)[0]);
            let v = if value < mean - self.offset { 0 } else { 255 };
            Rgba([v, v, v, 255])
        }))
    }
}

/// Blur, gradient, non-maximum suppression and hysteresis.
#[derive(Debug, Clone)]
pub struct CannyEdgeDetection {
    /// Pre-blur sigma in pixels.
    pub blur_radius: f32,
    /// Hysteresis thresholds, normalized.
    pub lower_threshold: f32,
    pub upper_threshold: f32,
}

impl Default for CannyEdgeDetection {
    fn default() -> Self {
        Self {
            blur_radius: 2.0,
            lower_threshold: 0.1,
            upper_threshold: 0.4,
        }
    }
}

impl Operation for CannyEdgeDetection {
    fn name(&self) -> &'static str {
        "CannyEdgeDetection"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let mut gray = to_gray(image);
        if self.blur_radius > 0.0 && self.blur_radius.is_finite() {
            gray = imageproc::filter::gaussian_blur_f32(&gray, self.blur_radius);
        }

        let low = self.lower_threshold.max(0.0) * 255.0;
        let high = (self.upper_threshold * 255.0).max(low);
        let edges = imageproc::edges::canny(&gray, low, high);
        Ok(gray_to_rgba(&edges))
    }
}

/// Two lookup tables with a soft glow between them.
#[derive(Debug, Clone)]
pub struct SoftElegance {
    pub first: Lookup,
    pub blur: GaussianBlur,
    /// Share of the blurred copy mixed back in.
    pub glow: f32,
    pub second: Lookup,
}

impl SoftElegance {
    pub fn new(first: Arc<RgbaImage>, second: Arc<RgbaImage>) -> Self {
        Self {
            first: Lookup::new(first),
            blur: GaussianBlur::new(9.7),
            glow: 0.14,
            second: Lookup::new(second),
        }
    }
}

impl Operation for SoftElegance {
    fn name(&self) -> &'static str {
        "SoftElegance"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let generation = inputs[0].generation();
        let graded = self.first.render(&[Frame::new(image.clone(), generation)])?;
        let blurred = self.blur.apply(&graded);

        let mut glowing = graded;
        for (x, y, pixel) in glowing.enumerate_pixels_mut() {
            let soft = blurred.get_pixel(x, y);
            for c in 0..3 {
                pixel[c] = from_unit(mix(to_unit(pixel[c]), to_unit(soft[c]), self.glow));
            }
        }
        self.second.render(&[Frame::new(glowing, generation)])
    }
}

/// Binarizes against the frame's own mean luminance.
#[derive(Debug, Clone)]
pub struct AverageLuminanceThreshold {
    pub threshold_multiplier: f32,
}

impl Default for AverageLuminanceThreshold {
    fn default() -> Self {
        Self {
            threshold_multiplier: 1.0,
        }
    }
}

impl Operation for AverageLuminanceThreshold {
    fn name(&self) -> &'static str {
        "AverageLuminanceThreshold"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let threshold = inputs[0].mean_luminance() * self.threshold_multiplier;
        Ok(map_pixels(image, |c| {
            let v = if luminance(&c) >= threshold { 1.0 } else { 0.0 };
            [v, v, v, c[3]]
        }))
    }
}

/// Two morphology passes in sequence.
#[derive(Debug, Clone)]
pub struct MorphologyPair {
    first: MorphologyFilter,
    second: MorphologyFilter,
}

impl MorphologyPair {
    /// Erosion then dilation. Removes small bright specks.
    pub fn opening() -> Self {
        Self {
            first: MorphologyFilter::erosion(),
            second: MorphologyFilter::dilation(),
        }
    }

    /// Dilation then erosion. Fills small dark holes.
    pub fn closing() -> Self {
        Self {
            first: MorphologyFilter::dilation(),
            second: MorphologyFilter::erosion(),
        }
    }
}

impl Operation for MorphologyPair {
    fn name(&self) -> &'static str {
        match self.first.operator {
            Morphology::Erosion => "Opening",
            Morphology::Dilation => "Closing",
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let generation = inputs[0].generation();
        let once = self.first.render(&[Frame::new(image.clone(), generation)])?;
        self.second.render(&[Frame::new(once, generation)])
    }
}

/// Frosted-glass blur: downsample, desaturate, blur, upsample and compress
/// the luminance range.
#[derive(Debug, Clone)]
pub struct IosBlur {
    /// Blur sigma in full-resolution pixels.
    pub blur_radius: f32,
    pub saturation: f32,
    pub downsampling: f32,
    pub range_reduction: f32,
}

impl Default for IosBlur {
    fn default() -> Self {
        Self {
            blur_radius: 12.0,
            saturation: 0.8,
            downsampling: 4.0,
            range_reduction: 0.6,
        }
    }
}

impl Operation for IosBlur {
    fn name(&self) -> &'static str {
        "iOSBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        let factor = self.downsampling.max(1.0);
        let small_w = ((width as f32 / factor).round() as u32).max(1);
        let small_h = ((height as f32 / factor).round() as u32).max(1);

        let small = imageops::resize(image, small_w, small_h, imageops::FilterType::Triangle);
        let saturation = self.saturation;
        let small = map_pixels(&small, |c| {
            let l = luminance(&c);
            [mix(l, c[0], saturation), mix(l, c[1], saturation), mix(l, c[2], saturation), c[3]]
        });
        let small = GaussianBlur::new(self.blur_radius / factor).apply(&small);
        let restored = imageops::resize(&small, width, height, imageops::FilterType::Triangle);

        let reduction = self.range_reduction;
        Ok(map_pixels(&restored, |c| {
            let shift = (0.5 - luminance(&c)) * reduction;
            [c[0] + shift, c[1] + shift, c[2] + shift, c[3]]
        }))
    }
}

/// Sharp horizontal band with blur fading in above and below it.
#[derive(Debug, Clone)]
pub struct TiltShift {
    pub blur: GaussianBlur,
    pub top_focus_level: f32,
    pub bottom_focus_level: f32,
    pub focus_fall_off_rate: f32,
}

impl Default for TiltShift {
    fn default() -> Self {
        Self {
            blur: GaussianBlur::new(7.0),
            top_focus_level: 0.4,
            bottom_focus_level: 0.6,
            focus_fall_off_rate: 0.2,
        }
    }
}

impl Operation for TiltShift {
    fn name(&self) -> &'static str {
        "TiltShift"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let blurred = self.blur.apply(image);
        let (top, bottom, fall_off) = (
            self.top_focus_level,
            self.bottom_focus_level,
            self.focus_fall_off_rate,
        );
        Ok(map_pixels_at(image, |u, v, c| {
            let amount = 1.0 - smoothstep(top - fall_off, top, v)
                + smoothstep(bottom, bottom + fall_off, v);
            let x = ((u * blurred.width() as f32) as u32).min(blurred.width() - 1);
            let y = ((v * blurred.height() as f32) as u32).min(blurred.height() - 1);
            let soft = unit_rgba(blurred.get_pixel(x, y));
            let t = amount.clamp(0.0, 1.0);
            [mix(c[0], soft[0], t), mix(c[1], soft[1], t), mix(c[2], soft[2], t), c[3]]
        }))
    }
}

/// Spreads each color channel over the full range by its cumulative histogram.
#[derive(Debug, Clone, Default)]
pub struct HistogramEqualization;

impl Operation for HistogramEqualization {
    fn name(&self) -> &'static str {
        "HistogramEqualization"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        let channels: Vec<GrayImage> = (0..3)
            .map(|c| {
                let plane = GrayImage::from_fn(width, height, |x, y| {
                    Luma([image.get_pixel(x, y)[c]])
                });
                imageproc::contrast::equalize_histogram(&plane)
            })
            .collect();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([
                channels[0].get_pixel(x, y)[0],
                channels[1].get_pixel(x, y)[0],
                channels[2].get_pixel(x, y)[0],
                image.get_pixel(x, y)[3],
            ])
        }))
    }
}

/// Temporal low-pass: each output mixes the new frame with the previous
/// output. Restarts when the frame size changes.
#[derive(Debug, Clone)]
pub struct LowPass {
    /// Weight of the previous output, `0.0..=1.0`.
    pub strength: f32,
    previous: Option<RgbaImage>,
}

impl Default for LowPass {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl LowPass {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            previous: None,
        }
    }

    fn apply(&mut self, image: &RgbaImage) -> RgbaImage {
        let strength = self.strength.clamp(0.0, 1.0);
        let output = match self.previous.take() {
            Some(previous) if previous.dimensions() == image.dimensions() => {
                let mut mixed = image.clone();
                for (x, y, pixel) in mixed.enumerate_pixels_mut() {
                    let old = previous.get_pixel(x, y);
                    for c in 0..4 {
                        pixel[c] = from_unit(mix(to_unit(pixel[c]), to_unit(old[c]), strength));
                    }
                }
                mixed
            }
            _ => image.clone(),
        };
        self.previous = Some(output.clone());
        output
    }
}

impl Operation for LowPass {
    fn name(&self) -> &'static str {
        "LowPass"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        Ok(self.apply(image))
    }
}

/// What changed since the low-passed history: the absolute difference.
#[derive(Debug, Clone, Default)]
pub struct HighPass {
    pub low_pass: LowPass,
}

fn difference(a: &RgbaImage, b: &RgbaImage) -> RgbaImage {
    RgbaImage::from_fn(a.width(), a.height(), |x, y| {
        let (p, q) = (a.get_pixel(x, y), b.get_pixel(x, y));
        Rgba([p[0].abs_diff(q[0]), p[1].abs_diff(q[1]), p[2].abs_diff(q[2]), 255])
    })
}

impl Operation for HighPass {
    fn name(&self) -> &'static str {
        "HighPass"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let smoothed = self.low_pass.apply(image);
        Ok(difference(image, &smoothed))
    }
}

/// Marks pixels that moved away from the low-passed history and records the
/// moving share of the frame and its centroid.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    pub low_pass: LowPass,
    /// Luminance change that counts as motion.
    pub sensitivity: f32,
    motion: Option<(f32, f32, f32)>,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self {
            low_pass: LowPass::new(0.5),
            sensitivity: 0.1,
            motion: None,
        }
    }
}

impl MotionDetector {
    /// Share of moving pixels, then centroid `(x, y)` normalized. `None`
    /// before the first frame.
    pub fn motion(&self) -> Option<(f32, f32, f32)> {
        self.motion
    }
}

impl Operation for MotionDetector {
    fn name(&self) -> &'static str {
        "MotionDetector"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let smoothed = self.low_pass.apply(image);
        let changed = difference(image, &smoothed);
        let (width, height) = image.dimensions();

        let mut count = 0.0f32;
        let (mut sum_x, mut sum_y) = (0.0f32, 0.0f32);
        let mask = RgbaImage::from_fn(width, height, |x, y| {
            let moving = luminance(&unit_rgba(changed.get_pixel(x, y))) > self.sensitivity;
            if moving {
                count += 1.0;
                sum_x += (x as f32 + 0.5) / width as f32;
                sum_y += (y as f32 + 0.5) / height as f32;
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });

        let share = count / (width * height) as f32;
        self.motion = Some(if count > 0.0 {
            (share, sum_x / count, sum_y / count)
        } else {
            (0.0, 0.5, 0.5)
        });
        Ok(mask)
    }
}

/// Colour FAST descriptor: each channel encodes how the blurred center
/// differs from a ring of samples around it, biased to mid-gray.
#[derive(Debug, Clone)]
pub struct ColourFast {
    pub blur_radius: f32,
}

impl Default for ColourFast {
    fn default() -> Self {
        Self { blur_radius: 3.0 }
    }
}

impl ColourFast {
    const RING: [(i64, i64); 8] = [(-1, -1), (0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0)];
}

impl Operation for ColourFast {
    fn name(&self) -> &'static str {
        "ColourFASTFeatureDetection"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let radius = self.blur_radius.max(0.0).round() as u32;
        let blurred = if radius > 0 {
            let taps = 2 * radius as usize + 1;
            let kernel = vec![1.0f32 / taps as f32; taps];
            imageproc::filter::separable_filter_equal(image, &kernel)
        } else {
            image.clone()
        };
        let stride = radius.max(1) as i64;

        let mut result = blurred.clone();
        for (x, y, out) in result.enumerate_pixels_mut() {
            let center = unit_rgba(sample_clamped(&blurred, x as i64, y as i64));
            let mut ring = [0.0f32; 3];
            for (dx, dy) in Self::RING {
                let p = sample_clamped(&blurred, x as i64 + dx * stride, y as i64 + dy * stride);
                for c in 0..3 {
                    ring[c] += to_unit(p[c]) / Self::RING.len() as f32;
                }
            }
            for c in 0..3 {
                out[c] = from_unit(0.5 + 4.0 * (center[c] - ring[c]));
            }
            out[3] = 255;
        }
        Ok(result)
    }
}
