//! Geometry, kernels and blurs.

use crate::core::error::OperationError;
use crate::core::types::{Frame, Position};
use crate::engine::Operation;
use crate::operations::pixel::{
    convolve3x3, from_unit, gray_to_rgba, map_pixels_at, non_empty_input, sample_clamped,
    sample_normalized, to_gray, to_unit,
};
use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Rotates the frame about its center.
#[derive(Debug, Clone, Default)]
pub struct Transform {
    /// Radians, clockwise.
    pub angle: f32,
}

impl Operation for Transform {
    fn name(&self) -> &'static str {
        "Transform"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        if self.angle == 0.0 {
            return Ok(image.clone());
        }
        Ok(rotate_about_center(
            image,
            self.angle,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        ))
    }
}

/// Keeps a centered region, sized as a fraction of the input.
#[derive(Debug, Clone)]
pub struct Crop {
    pub width_fraction: f32,
    pub height_fraction: f32,
}

impl Default for Crop {
    fn default() -> Self {
        Self {
            width_fraction: 1.0,
            height_fraction: 1.0,
        }
    }
}

impl Operation for Crop {
    fn name(&self) -> &'static str {
        "Crop"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        let region = |total: u32, fraction: f32| {
            ((total as f32 * fraction.clamp(0.0, 1.0)).round() as u32).clamp(1, total)
        };
        let w = region(width, self.width_fraction);
        let h = region(height, self.height_fraction);
        let x = (width - w) / 2;
        let y = (height - h) / 2;
        Ok(imageops::crop_imm(image, x, y, w, h).to_image())
    }
}

/// Row-major 3x3 kernel applied to the color channels.
#[derive(Debug, Clone)]
pub struct Convolution3x3 {
    pub kernel: [f32; 9],
}

impl Convolution3x3 {
    pub const IDENTITY: [f32; 9] = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    pub const SOBEL_HORIZONTAL: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];

    pub fn new(kernel: [f32; 9]) -> Self {
        Self { kernel }
    }
}

impl Default for Convolution3x3 {
    fn default() -> Self {
        Self::new(Self::IDENTITY)
    }
}

impl Operation for Convolution3x3 {
    fn name(&self) -> &'static str {
        "Convolution3x3"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        Ok(convolve3x3(image, &self.kernel))
    }
}

/// Laplacian sharpening. Negative values soften.
#[derive(Debug, Clone, Default)]
pub struct Sharpen {
    pub sharpness: f32,
}

impl Operation for Sharpen {
    fn name(&self) -> &'static str {
        "Sharpen"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let s = self.sharpness;
        let kernel = [0.0, -s, 0.0, -s, 1.0 + 4.0 * s, -s, 0.0, -s, 0.0];
        Ok(convolve3x3(image, &kernel))
    }
}

#[derive(Debug, Clone)]
pub struct GaussianBlur {
    /// Standard deviation in pixels. Zero leaves the frame unchanged.
    pub sigma: f32,
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self { sigma: 2.0 }
    }
}

impl GaussianBlur {
    pub fn new(sigma: f32) -> Self {
        Self { sigma }
    }

    pub(crate) fn apply(&self, image: &RgbaImage) -> RgbaImage {
        // gaussian_blur_f32 panics on a non-positive sigma
        if self.sigma > 0.0 && self.sigma.is_finite() {
            imageproc::filter::gaussian_blur_f32(image, self.sigma)
        } else {
            image.clone()
        }
    }
}

impl Operation for GaussianBlur {
    fn name(&self) -> &'static str {
        "GaussianBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        Ok(self.apply(image))
    }
}

#[derive(Debug, Clone)]
pub struct BoxBlur {
    /// Half-width of the box in pixels.
    pub radius: f32,
}

impl Default for BoxBlur {
    fn default() -> Self {
        Self { radius: 2.0 }
    }
}

impl Operation for BoxBlur {
    fn name(&self) -> &'static str {
        "BoxBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let radius = self.radius.max(0.0).round() as usize;
        if radius == 0 {
            return Ok(image.clone());
        }
        let taps = 2 * radius + 1;
        let kernel = vec![1.0f32 / taps as f32; taps];
        Ok(imageproc::filter::separable_filter_equal(image, &kernel))
    }
}

/// Edge-preserving blur: neighbors that differ in color from the center
/// contribute less.
#[derive(Debug, Clone)]
pub struct BilateralBlur {
    pub distance_normalization_factor: f32,
    /// Window half-width in pixels.
    pub radius: u32,
}

impl Default for BilateralBlur {
    fn default() -> Self {
        Self {
            distance_normalization_factor: 8.0,
            radius: 2,
        }
    }
}

impl Operation for BilateralBlur {
    fn name(&self) -> &'static str {
        "BilateralBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let r = self.radius as i64;
        let sigma = (r as f32).max(1.0);
        let factor = self.distance_normalization_factor;

        let mut result = RgbaImage::new(image.width(), image.height());
        for (x, y, out) in result.enumerate_pixels_mut() {
            let center = image.get_pixel(x, y);
            let mut sum = [0.0f32; 3];
            let mut total = 0.0f32;

            for dy in -r..=r {
                for dx in -r..=r {
                    let sample = sample_clamped(image, x as i64 + dx, y as i64 + dy);
                    let color_distance = (0..3)
                        .map(|c| (to_unit(sample[c]) - to_unit(center[c])).powi(2))
                        .sum::<f32>()
                        .sqrt();
                    let spatial = (-((dx * dx + dy * dy) as f32) / (2.0 * sigma * sigma)).exp();
                    let weight = spatial * (1.0 - (color_distance * factor).min(1.0));
                    for c in 0..3 {
                        sum[c] += weight * to_unit(sample[c]);
                    }
                    total += weight;
                }
            }

            // The center always has weight 1, so total is positive.
            *out = Rgba([
                from_unit(sum[0] / total),
                from_unit(sum[1] / total),
                from_unit(sum[2] / total),
                center[3],
            ]);
        }
        Ok(result)
    }
}

/// Gradient kernel pair used for edge magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientOperator {
    #[default]
    Sobel,
    Prewitt,
}

/// Gradient magnitude on luminance.
#[derive(Debug, Clone)]
pub struct EdgeDetection {
    pub operator: GradientOperator,
    pub edge_strength: f32,
}

impl Default for EdgeDetection {
    fn default() -> Self {
        Self::sobel()
    }
}

impl EdgeDetection {
    pub fn sobel() -> Self {
        Self {
            operator: GradientOperator::Sobel,
            edge_strength: 1.0,
        }
    }

    pub fn prewitt() -> Self {
        Self {
            operator: GradientOperator::Prewitt,
            edge_strength: 1.0,
        }
    }

    /// Normalized edge magnitude per pixel.
    pub(crate) fn magnitudes(&self, image: &RgbaImage) -> Vec<f32> {
        let gray = to_gray(image);
        let gradients = match self.operator {
            GradientOperator::Sobel => imageproc::gradients::sobel_gradients(&gray),
            GradientOperator::Prewitt => imageproc::gradients::prewitt_gradients(&gray),
        };
        gradients
            .pixels()
            .map(|p| (p[0] as f32 / 255.0 * self.edge_strength).min(1.0))
            .collect()
    }
}

impl Operation for EdgeDetection {
    fn name(&self) -> &'static str {
        match self.operator {
            GradientOperator::Sobel => "SobelEdgeDetection",
            GradientOperator::Prewitt => "PrewittEdgeDetection",
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let magnitudes = self.magnitudes(image);
        let (width, height) = image.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let v = from_unit(magnitudes[(y * width + x) as usize]);
            Rgba([v, v, v, 255])
        }))
    }
}

/// White where the edge magnitude reaches the threshold, black elsewhere.
#[derive(Debug, Clone)]
pub struct ThresholdEdgeDetection {
    pub edges: EdgeDetection,
    pub threshold: f32,
}

impl Default for ThresholdEdgeDetection {
    fn default() -> Self {
        Self {
            edges: EdgeDetection::sobel(),
            threshold: 0.25,
        }
    }
}

impl Operation for ThresholdEdgeDetection {
    fn name(&self) -> &'static str {
        "ThresholdEdgeDetection"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let magnitudes = self.edges.magnitudes(image);
        let (width, height) = image.dimensions();
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let v = if magnitudes[(y * width + x) as usize] >= self.threshold {
                255
            } else {
                0
            };
            Rgba([v, v, v, 255])
        }))
    }
}

/// Morphological operator over a square window, per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Morphology {
    /// Maximum of the window.
    Dilation,
    /// Minimum of the window.
    Erosion,
}

#[derive(Debug, Clone)]
pub struct MorphologyFilter {
    pub operator: Morphology,
    pub radius: u32,
}

impl MorphologyFilter {
    pub fn dilation() -> Self {
        Self {
            operator: Morphology::Dilation,
            radius: 1,
        }
    }

    pub fn erosion() -> Self {
        Self {
            operator: Morphology::Erosion,
            radius: 1,
        }
    }
}

impl Operation for MorphologyFilter {
    fn name(&self) -> &'static str {
        match self.operator {
            Morphology::Dilation => "Dilation",
            Morphology::Erosion => "Erosion",
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let r = self.radius as i64;
        let mut result = image.clone();
        for (x, y, out) in result.enumerate_pixels_mut() {
            let mut acc = match self.operator {
                Morphology::Dilation => [0u8; 3],
                Morphology::Erosion => [255u8; 3],
            };
            for dy in -r..=r {
                for dx in -r..=r {
                    let p = sample_clamped(image, x as i64 + dx, y as i64 + dy);
                    for c in 0..3 {
                        acc[c] = match self.operator {
                            Morphology::Dilation => acc[c].max(p[c]),
                            Morphology::Erosion => acc[c].min(p[c]),
                        };
                    }
                }
            }
            out[0] = acc[0];
            out[1] = acc[1];
            out[2] = acc[2];
        }
        Ok(result)
    }
}

/// Resamples the frame by a scale factor with a Lanczos kernel.
#[derive(Debug, Clone)]
pub struct LanczosResampling {
    pub scale: f32,
}

impl Default for LanczosResampling {
    fn default() -> Self {
        Self { scale: 0.5 }
    }
}

impl Operation for LanczosResampling {
    fn name(&self) -> &'static str {
        "LanczosResampling"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        let resize = |total: u32| ((total as f32 * scale).round() as u32).max(1);
        Ok(imageops::resize(
            image,
            resize(image.width()),
            resize(image.height()),
            imageops::FilterType::Lanczos3,
        ))
    }
}

/// Tap weights shared by the directional and zoom blurs, center first.
const STREAK_WEIGHTS: [f32; 5] = [0.18, 0.15, 0.12, 0.09, 0.05];

/// Averages samples along a line through each pixel.
#[derive(Debug, Clone)]
pub struct MotionBlur {
    /// Spacing between samples, in pixels.
    pub blur_size: f32,
    /// Direction in degrees.
    pub angle: f32,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            blur_size: 2.5,
            angle: 0.0,
        }
    }
}

impl Operation for MotionBlur {
    fn name(&self) -> &'static str {
        "MotionBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (dx, dy) = (cos * self.blur_size, sin * self.blur_size);

        let mut result = image.clone();
        for (x, y, out) in result.enumerate_pixels_mut() {
            let mut sum = [0.0f32; 4];
            for (step, weight) in STREAK_WEIGHTS.iter().enumerate() {
                let offsets: &[f32] = if step == 0 { &[0.0] } else { &[1.0, -1.0] };
                for sign in offsets {
                    let k = sign * step as f32;
                    let p = sample_clamped(
                        image,
                        (x as f32 + k * dx).round() as i64,
                        (y as f32 + k * dy).round() as i64,
                    );
                    for c in 0..4 {
                        sum[c] += weight * to_unit(p[c]);
                    }
                }
            }
            *out = Rgba([from_unit(sum[0]), from_unit(sum[1]), from_unit(sum[2]), from_unit(sum[3])]);
        }
        Ok(result)
    }
}

/// Blurs along rays from a center point.
#[derive(Debug, Clone)]
pub struct ZoomBlur {
    pub blur_size: f32,
    pub center: Position,
}

impl Default for ZoomBlur {
    fn default() -> Self {
        Self {
            blur_size: 1.0,
            center: Position::CENTER,
        }
    }
}

impl Operation for ZoomBlur {
    fn name(&self) -> &'static str {
        "ZoomBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        Ok(map_pixels_at(image, |u, v, _| {
            let du = (self.center.x - u) * self.blur_size / 100.0;
            let dv = (self.center.y - v) * self.blur_size / 100.0;
            let mut sum = [0.0f32; 4];
            for (step, weight) in STREAK_WEIGHTS.iter().enumerate() {
                let offsets: &[f32] = if step == 0 { &[0.0] } else { &[1.0, -1.0] };
                for sign in offsets {
                    let k = sign * step as f32;
                    let sample = sample_normalized(image, u + k * du, v + k * dv);
                    for c in 0..4 {
                        sum[c] += weight * sample[c];
                    }
                }
            }
            sum
        }))
    }
}

/// Gaussian blur of the luminance only, as an opaque gray frame.
#[derive(Debug, Clone)]
pub struct SingleComponentGaussianBlur {
    pub sigma: f32,
}

impl Default for SingleComponentGaussianBlur {
    fn default() -> Self {
        Self { sigma: 2.0 }
    }
}

impl Operation for SingleComponentGaussianBlur {
    fn name(&self) -> &'static str {
        "SingleComponentGaussianBlur"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let mut gray = to_gray(image);
        if self.sigma > 0.0 && self.sigma.is_finite() {
            gray = imageproc::filter::gaussian_blur_f32(&gray, self.sigma);
        }
        Ok(gray_to_rgba(&gray))
    }
}

/// 3x3 median of each color channel.
#[derive(Debug, Clone, Default)]
pub struct MedianFilter;

impl Operation for MedianFilter {
    fn name(&self) -> &'static str {
        "MedianFilter"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let mut result = image.clone();
        for (x, y, out) in result.enumerate_pixels_mut() {
            for c in 0..3 {
                let mut window = [0u8; 9];
                for (i, value) in window.iter_mut().enumerate() {
                    let dx = (i % 3) as i64 - 1;
                    let dy = (i / 3) as i64 - 1;
                    *value = sample_clamped(image, x as i64 + dx, y as i64 + dy)[c];
                }
                window.sort_unstable();
                out[c] = window[4];
            }
        }
        Ok(result)
    }
}

/// Encodes, for each pixel, which of its eight neighbors are brighter.
#[derive(Debug, Clone, Default)]
pub struct LocalBinaryPattern {
    /// Compare each color channel separately instead of luminance.
    pub per_channel: bool,
}

impl LocalBinaryPattern {
    /// Neighbor offsets, one bit each, most significant first.
    const NEIGHBORS: [(i64, i64); 8] = [
        (1, 1),
        (1, 0),
        (1, -1),
        (0, -1),
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, 1),
    ];

    pub fn color() -> Self {
        Self { per_channel: true }
    }

    fn pattern(sample: impl Fn(i64, i64) -> u8) -> u8 {
        let center = sample(0, 0);
        Self::NEIGHBORS
            .iter()
            .fold(0u8, |code, &(dx, dy)| (code << 1) | (sample(dx, dy) > center) as u8)
    }
}

impl Operation for LocalBinaryPattern {
    fn name(&self) -> &'static str {
        if self.per_channel {
            "ColorLocalBinaryPattern"
        } else {
            "LocalBinaryPattern"
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let (width, height) = image.dimensions();
        if self.per_channel {
            return Ok(RgbaImage::from_fn(width, height, |x, y| {
                let code = |c: usize| {
                    Self::pattern(|dx, dy| sample_clamped(image, x as i64 + dx, y as i64 + dy)[c])
                };
                Rgba([code(0), code(1), code(2), 255])
            }));
        }

        let gray = to_gray(image);
        let (max_x, max_y) = (width as i64 - 1, height as i64 - 1);
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let v = Self::pattern(|dx, dy| {
                let sx = (x as i64 + dx).clamp(0, max_x) as u32;
                let sy = (y as i64 + dy).clamp(0, max_y) as u32;
                gray.get_pixel(sx, sy)[0]
            });
            Rgba([v, v, v, 255])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Color, Size};

    fn dot_frame() -> Frame {
        let mut image = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        image.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        Frame::new(image, 1)
    }

    #[test]
    fn test_crop_is_centered() {
        let mut crop = Crop {
            width_fraction: 1.0,
            height_fraction: 0.5,
        };
        let frame = Frame::solid(Size::new(10, 10), Color::RED, 1);
        let out = crop.render(&[frame]).unwrap();
        assert_eq!(out.dimensions(), (10, 5));

        crop.height_fraction = 0.0;
        let frame = Frame::solid(Size::new(10, 10), Color::RED, 1);
        assert_eq!(crop.render(&[frame]).unwrap().dimensions(), (10, 1));
    }

    #[test]
    fn test_zero_blur_is_identity() {
        let frame = dot_frame();
        let expected = frame.image().clone();
        assert_eq!(GaussianBlur::new(0.0).render(&[frame.clone()]).unwrap(), expected);
        assert_eq!(BoxBlur { radius: 0.0 }.render(&[frame]).unwrap(), expected);
    }

    #[test]
    fn test_blur_spreads_dot() {
        let out = GaussianBlur::new(1.0).render(&[dot_frame()]).unwrap();
        assert!(out.get_pixel(4, 4)[0] < 255);
        assert!(out.get_pixel(5, 4)[0] > 0);

        let out = BoxBlur { radius: 1.0 }.render(&[dot_frame()]).unwrap();
        assert!(out.get_pixel(5, 5)[0] > 0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_morphology() {
        let dilated = MorphologyFilter::dilation().render(&[dot_frame()]).unwrap();
        assert_eq!(dilated.get_pixel(5, 5)[0], 255);
        assert_eq!(dilated.get_pixel(6, 6)[0], 0);

        let eroded = MorphologyFilter::erosion().render(&[dot_frame()]).unwrap();
        assert_eq!(eroded.get_pixel(4, 4)[0], 0);
    }

    #[test]
    fn test_sobel_flat_image_has_no_edges() {
        let frame = Frame::solid(Size::new(6, 6), Color::rgb(0.3, 0.6, 0.9), 1);
        let out = EdgeDetection::sobel().render(&[frame]).unwrap();
        assert!(out.pixels().all(|p| p[0] == 0));

        let out = EdgeDetection::sobel().render(&[dot_frame()]).unwrap();
        assert!(out.get_pixel(3, 4)[0] > 0);
    }

    #[test]
    fn test_bilateral_keeps_flat_regions() {
        let frame = Frame::solid(Size::new(5, 5), Color::rgb(0.2, 0.4, 0.6), 1);
        let expected = frame.image().clone();
        let out = BilateralBlur::default().render(&[frame]).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_transform_keeps_size() {
        let mut transform = Transform {
            angle: std::f32::consts::FRAC_PI_4,
        };
        let out = transform.render(&[dot_frame()]).unwrap();
        assert_eq!(out.dimensions(), (9, 9));
    }

    #[test]
    fn test_sharpen_zero_is_identity() {
        let frame = dot_frame();
        let expected = frame.image().clone();
        assert_eq!(Sharpen::default().render(&[frame]).unwrap(), expected);
    }

    #[test]
    fn test_threshold_edges_are_binary() {
        let out = ThresholdEdgeDetection::default().render(&[dot_frame()]).unwrap();
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(3, 4)[0], 255);
        assert_eq!(out.get_pixel(0, 0)[0], 0);

        let prewitt = EdgeDetection::prewitt();
        assert_eq!(prewitt.name(), "PrewittEdgeDetection");
        let out = EdgeDetection::prewitt().render(&[dot_frame()]).unwrap();
        assert!(out.get_pixel(3, 4)[0] > 0);
    }

    #[test]
    fn test_lanczos_scales_size() {
        let out = LanczosResampling::default().render(&[dot_frame()]).unwrap();
        assert_eq!(out.dimensions(), (5, 5));

        let mut tiny = LanczosResampling { scale: 0.01 };
        assert_eq!(tiny.render(&[dot_frame()]).unwrap().dimensions(), (1, 1));
    }

    #[test]
    fn test_streak_blurs_keep_flat_frames() {
        let frame = Frame::solid(Size::new(8, 8), Color::rgb(0.2, 0.4, 0.6), 1);
        let expected = frame.image().clone();
        let close = |out: &RgbaImage| {
            out.pixels()
                .zip(expected.pixels())
                .all(|(a, b)| (0..4).all(|c| (a[c] as i32 - b[c] as i32).abs() <= 1))
        };
        assert!(close(&MotionBlur::default().render(&[frame.clone()]).unwrap()));
        assert!(close(&ZoomBlur::default().render(&[frame]).unwrap()));
    }

    #[test]
    fn test_motion_blur_streaks_horizontally() {
        let out = MotionBlur {
            blur_size: 1.0,
            angle: 0.0,
        }
        .render(&[dot_frame()])
        .unwrap();
        assert!(out.get_pixel(5, 4)[0] > 0);
        assert_eq!(out.get_pixel(4, 5)[0], 0);
    }

    #[test]
    fn test_single_component_blur_is_gray() {
        let out = SingleComponentGaussianBlur::default().render(&[dot_frame()]).unwrap();
        assert!(out.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
        assert!(out.get_pixel(5, 4)[0] > 0);
    }

    #[test]
    fn test_median_removes_isolated_dot() {
        let out = MedianFilter.render(&[dot_frame()]).unwrap();
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_local_binary_pattern_codes() {
        // Nothing around the dot is brighter than it.
        let out = LocalBinaryPattern::default().render(&[dot_frame()]).unwrap();
        assert_eq!(out.get_pixel(4, 4)[0], 0);
        assert_ne!(out.get_pixel(3, 4)[0], 0);

        let flat = Frame::solid(Size::new(4, 4), Color::RED, 1);
        let out = LocalBinaryPattern::color().render(&[flat]).unwrap();
        assert!(out.pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }

    #[test]
    fn test_kernels_and_blurs_reject_empty_frames() {
        let empty = Frame::new(RgbaImage::new(0, 0), 1);
        let mut units: Vec<Box<dyn Operation>> = vec![
            Box::new(Transform {
                angle: std::f32::consts::FRAC_PI_4,
            }),
            Box::new(Transform::default()),
            Box::new(Crop::default()),
            Box::new(Convolution3x3::default()),
            Box::new(Sharpen::default()),
            Box::new(GaussianBlur::default()),
            Box::new(BoxBlur::default()),
            Box::new(BilateralBlur::default()),
            Box::new(EdgeDetection::sobel()),
            Box::new(EdgeDetection::prewitt()),
            Box::new(ThresholdEdgeDetection::default()),
            Box::new(MorphologyFilter::dilation()),
            Box::new(MorphologyFilter::erosion()),
            Box::new(LanczosResampling::default()),
            Box::new(MotionBlur::default()),
            Box::new(ZoomBlur::default()),
            Box::new(SingleComponentGaussianBlur::default()),
            Box::new(MedianFilter),
            Box::new(LocalBinaryPattern::default()),
            Box::new(LocalBinaryPattern::color()),
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
}
