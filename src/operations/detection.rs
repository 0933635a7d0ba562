//! Analysis units: histogram, corner detection and frame averages.

use crate::core::error::OperationError;
use crate::core::types::{Color, Frame, Position, Size};
use crate::engine::Operation;
use crate::operations::pixel::{from_unit, luminance, non_empty_input, single_input, to_gray};
use crossbeam::channel::Sender;
use image::{Rgba, RgbaImage};

/// Number of histogram bins per channel.
pub const HISTOGRAM_BINS: u32 = 256;

// ============================================================================
// Histogram
// ============================================================================

/// Per-channel histogram of the input.
///
/// The output is a 256x1 strip; each pixel holds the bin counts of the three
/// color channels scaled so the fullest bin is 255.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Only every n-th pixel in each direction is counted.
    pub downsampling: u32,
}

impl Default for Histogram {
    fn default() -> Self {
        Self { downsampling: 16 }
    }
}

impl Operation for Histogram {
    fn name(&self) -> &'static str {
        "Histogram"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = single_input(self.name(), inputs)?;
        let step = self.downsampling.max(1) as usize;
        let mut bins = [[0u32; HISTOGRAM_BINS as usize]; 3];

        for y in (0..image.height()).step_by(step) {
            for x in (0..image.width()).step_by(step) {
                let p = image.get_pixel(x, y);
                for (channel, bin) in bins.iter_mut().enumerate() {
                    bin[p[channel] as usize] += 1;
                }
            }
        }

        let peak = bins.iter().flatten().copied().max().unwrap_or(0).max(1) as f32;
        Ok(RgbaImage::from_fn(HISTOGRAM_BINS, 1, |x, _| {
            let scale = |channel: usize| (bins[channel][x as usize] as f32 / peak * 255.0).round() as u8;
            Rgba([scale(0), scale(1), scale(2), 255])
        }))
    }
}

/// Draws a histogram strip as overlapping per-channel bar charts.
#[derive(Debug, Clone)]
pub struct HistogramDisplay {
    /// Output size. Defaults to the strip size when unset.
    pub size: Option<Size>,
}

impl HistogramDisplay {
    pub fn new(size: Size) -> Self {
        Self { size: Some(size) }
    }
}

impl Operation for HistogramDisplay {
    fn name(&self) -> &'static str {
        "HistogramDisplay"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let strip = single_input(self.name(), inputs)?;
        if strip.width() == 0 || strip.height() == 0 {
            return Err(OperationError::Failed {
                operation: "HistogramDisplay",
                reason: "histogram strip is empty".to_string(),
            });
        }
        let size = self
            .size
            .unwrap_or_else(|| Size::new(strip.width(), strip.width()));

        let bins = strip.width() as u64;
        let columns = size.width.max(1) as u64;
        // Each column shows the fullest of the bins it covers.
        let column_counts: Vec<[u8; 3]> = (0..columns)
            .map(|x| {
                let first = x * bins / columns;
                let last = ((x + 1) * bins / columns).max(first + 1).min(bins);
                let mut peak = [0u8; 3];
                for bin in first..last {
                    let p = strip.get_pixel(bin as u32, 0);
                    for c in 0..3 {
                        peak[c] = peak[c].max(p[c]);
                    }
                }
                peak
            })
            .collect();

        Ok(RgbaImage::from_fn(size.width, size.height, |x, y| {
            let counts = column_counts[x as usize];
            // Height above the bottom edge, normalized.
            let level = 1.0 - (y as f32 + 0.5) / size.height as f32;
            let lit = |channel: usize| {
                if counts[channel] as f32 / 255.0 >= level {
                    255
                } else {
                    0
                }
            };
            let pixel = [lit(0), lit(1), lit(2)];
            let alpha = if pixel.iter().any(|&v| v > 0) { 255 } else { 0 };
            Rgba([pixel[0], pixel[1], pixel[2], alpha])
        }))
    }
}

// ============================================================================
// Corner detection
// ============================================================================

/// Corner score computed from the local structure tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CornerResponse {
    /// `det - k * trace^2`.
    #[default]
    Harris,
    /// `det / trace`, no tuning constant.
    Noble,
    /// Smaller eigenvalue of the tensor.
    ShiTomasi,
}

impl CornerResponse {
    const HARRIS_K: f32 = 0.04;

    fn score(&self, xx: f32, yy: f32, xy: f32) -> f32 {
        let det = xx * yy - xy * xy;
        let trace = xx + yy;
        match self {
            CornerResponse::Harris => det - Self::HARRIS_K * trace * trace,
            CornerResponse::Noble => 2.0 * det / (trace + 1e-5),
            CornerResponse::ShiTomasi => {
                0.5 * (trace - ((xx - yy).powi(2) + 4.0 * xy * xy).sqrt())
            }
        }
    }
}

/// Corner detector over the luminance structure tensor.
///
/// Passes its input through unchanged and reports detected corners, in
/// normalized coordinates, on an optional channel after each render.
#[derive(Debug)]
pub struct CornerDetector {
    pub response: CornerResponse,
    /// `0.0..=1.0`, relative to the strongest response in the frame.
    pub threshold: f32,
    pub max_corners: usize,
    corners: Vec<Position>,
    listener: Option<Sender<Vec<Position>>>,
}

impl Default for CornerDetector {
    fn default() -> Self {
        Self::new(CornerResponse::Harris)
    }
}

impl CornerDetector {
    /// Half-width of the window the tensor is summed over.
    const WINDOW: i64 = 2;

    pub fn new(response: CornerResponse) -> Self {
        Self {
            response,
            threshold: 0.2,
            max_corners: 256,
            corners: Vec::new(),
            listener: None,
        }
    }

    /// Send every detection result to `listener`.
    pub fn notify(&mut self, listener: Sender<Vec<Position>>) {
        self.listener = Some(listener);
    }

    /// Corners found by the latest render.
    pub fn corners(&self) -> &[Position] {
        &self.corners
    }

    fn scores(&self, image: &RgbaImage) -> Vec<f32> {
        let gray = to_gray(image);
        let (width, height) = (gray.width() as i64, gray.height() as i64);
        let at = |x: i64, y: i64| {
            gray.get_pixel(x.clamp(0, width - 1) as u32, y.clamp(0, height - 1) as u32)[0] as f32
                / 255.0
        };

        let len = (width * height) as usize;
        let (mut xx, mut yy, mut xy) = (vec![0.0; len], vec![0.0; len], vec![0.0; len]);
        for y in 0..height {
            for x in 0..width {
                let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                    - at(x - 1, y - 1)
                    - 2.0 * at(x - 1, y)
                    - at(x - 1, y + 1);
                let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                    - at(x - 1, y - 1)
                    - 2.0 * at(x, y - 1)
                    - at(x + 1, y - 1);
                let i = (y * width + x) as usize;
                xx[i] = gx * gx;
                yy[i] = gy * gy;
                xy[i] = gx * gy;
            }
        }

        let xx = window_sum(&xx, width, height, Self::WINDOW);
        let yy = window_sum(&yy, width, height, Self::WINDOW);
        let xy = window_sum(&xy, width, height, Self::WINDOW);
        (0..len)
            .map(|i| self.response.score(xx[i], yy[i], xy[i]))
            .collect()
    }

    /// Local maxima above the threshold, strongest first.
    fn detect(&self, image: &RgbaImage) -> Vec<Position> {
        let scores = self.scores(image);
        let (width, height) = (image.width() as i64, image.height() as i64);
        let peak = scores.iter().copied().fold(0.0f32, f32::max);
        if peak <= f32::EPSILON {
            return Vec::new();
        }
        let floor = peak * self.threshold.clamp(0.0, 1.0).max(0.01);
        let score = |x: i64, y: i64| scores[(y * width + x) as usize];

        let mut found: Vec<(f32, i64, i64)> = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let s = score(x, y);
                if s < floor {
                    continue;
                }
                let mut is_peak = true;
                'window: for dy in -1..=1i64 {
                    for dx in -1..=1i64 {
                        let (nx, ny) = (x + dx, y + dy);
                        if (dx, dy) == (0, 0) || nx < 0 || ny < 0 || nx >= width || ny >= height {
                            continue;
                        }
                        // Ties go to the first pixel in scan order.
                        let neighbor = score(nx, ny);
                        let earlier = (ny, nx) < (y, x);
                        if neighbor > s || (earlier && neighbor == s) {
                            is_peak = false;
                            break 'window;
                        }
                    }
                }
                if is_peak {
                    found.push((s, x, y));
                }
            }
        }

        found.sort_by(|a, b| b.0.total_cmp(&a.0));
        found.truncate(self.max_corners);
        found
            .into_iter()
            .map(|(_, x, y)| {
                Position::new(
                    (x as f32 + 0.5) / width as f32,
                    (y as f32 + 0.5) / height as f32,
                )
            })
            .collect()
    }
}

/// Sum over a square window with clamped edges, done as two separable passes.
fn window_sum(values: &[f32], width: i64, height: i64, radius: i64) -> Vec<f32> {
    let index = |x: i64, y: i64| (y.clamp(0, height - 1) * width + x.clamp(0, width - 1)) as usize;
    let mut rows = vec![0.0; values.len()];
    for y in 0..height {
        for x in 0..width {
            rows[index(x, y)] = (-radius..=radius).map(|d| values[index(x + d, y)]).sum();
        }
    }
    let mut result = vec![0.0; values.len()];
    for y in 0..height {
        for x in 0..width {
            result[index(x, y)] = (-radius..=radius).map(|d| rows[index(x, y + d)]).sum();
        }
    }
    result
}

impl Operation for CornerDetector {
    fn name(&self) -> &'static str {
        match self.response {
            CornerResponse::Harris => "HarrisCornerDetector",
            CornerResponse::Noble => "NobleCornerDetector",
            CornerResponse::ShiTomasi => "ShiTomasiFeatureDetector",
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        self.corners = self.detect(image);
        log::debug!("{} found {} corner(s)", self.name(), self.corners.len());

        if let Some(listener) = &self.listener {
            if listener.send(self.corners.clone()).is_err() {
                log::debug!("Corner listener is gone");
                self.listener = None;
            }
        }

        Ok(image.clone())
    }
}

// ============================================================================
// Averages
// ============================================================================

/// Fills the frame with its average color.
#[derive(Debug, Clone, Default)]
pub struct AverageColor {
    average: Option<Color>,
}

impl AverageColor {
    /// Average of the latest render.
    pub fn average(&self) -> Option<Color> {
        self.average
    }
}

/// Mean of every channel, normalized.
pub(crate) fn mean_color(image: &RgbaImage) -> [f32; 4] {
    let mut sum = [0.0f64; 4];
    for p in image.pixels() {
        for c in 0..4 {
            sum[c] += p[c] as f64;
        }
    }
    let n = (image.width() as f64 * image.height() as f64).max(1.0) * 255.0;
    [
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
        (sum[3] / n) as f32,
    ]
}

impl Operation for AverageColor {
    fn name(&self) -> &'static str {
        "AverageColorExtractor"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let [r, g, b, a] = mean_color(image);
        let color = Color::new(r, g, b, a);
        self.average = Some(color);
        Ok(RgbaImage::from_pixel(image.width(), image.height(), color.to_rgba8()))
    }
}

/// Fills the frame with the gray of its mean luminance.
#[derive(Debug, Clone, Default)]
pub struct AverageLuminance {
    luminance: Option<f32>,
}

impl AverageLuminance {
    pub fn luminance(&self) -> Option<f32> {
        self.luminance
    }
}

impl Operation for AverageLuminance {
    fn name(&self) -> &'static str {
        "AverageLuminanceExtractor"
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let image = non_empty_input(self.name(), inputs)?;
        let l = luminance(&mean_color(image));
        self.luminance = Some(l);
        let v = from_unit(l);
        Ok(RgbaImage::from_pixel(image.width(), image.height(), Rgba([v, v, v, 255])))
    }
}
