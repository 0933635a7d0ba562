//! Zero-input units that draw their own frames.

use crate::core::error::OperationError;
use crate::core::types::{Color, Frame, Position, Size};
use crate::engine::Operation;
use crate::operations::pixel;
use crossbeam::channel::Receiver;
use image::RgbaImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

fn canvas(size: Size, color: Color) -> Result<RgbaImage, OperationError> {
    if size.pixels() == 0 {
        return Err(OperationError::Failed {
            operation: "Generator",
            reason: format!("cannot render an empty {} canvas", size),
        });
    }
    Ok(RgbaImage::from_pixel(size.width, size.height, color.to_rgba8()))
}

// ============================================================================
// Solid color
// ============================================================================

/// Fills the canvas with one color.
#[derive(Debug, Clone)]
pub struct SolidColor {
    pub size: Size,
    pub color: Color,
}

impl SolidColor {
    pub fn new(size: Size, color: Color) -> Self {
        Self { size, color }
    }
}

impl Operation for SolidColor {
    fn name(&self) -> &'static str {
        "SolidColor"
    }

    fn inputs(&self) -> usize {
        0
    }

    fn render(&mut self, _inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        canvas(self.size, self.color)
    }
}

// ============================================================================
// Circle
// ============================================================================

/// A filled circle on a solid background.
#[derive(Debug, Clone)]
pub struct Circle {
    pub size: Size,
    /// Radius as a fraction of the canvas width.
    pub radius: f32,
    pub center: Position,
    pub color: Color,
    pub background: Color,
}

impl Circle {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            radius: 0.0,
            center: Position::CENTER,
            color: Color::WHITE,
            background: Color::BLACK,
        }
    }
}

impl Operation for Circle {
    fn name(&self) -> &'static str {
        "Circle"
    }

    fn inputs(&self) -> usize {
        0
    }

    fn render(&mut self, _inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let mut image = canvas(self.size, self.background)?;
        let radius = (self.radius * self.size.width as f32).round() as i32;
        if radius > 0 {
            let (cx, cy) = self.center.to_pixel(self.size);
            draw_filled_circle_mut(
                &mut image,
                (cx.round() as i32, cy.round() as i32),
                radius,
                self.color.to_rgba8(),
            );
        }
        Ok(image)
    }
}

// ============================================================================
// Lines
// ============================================================================

/// A line in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineSpec {
    Segment { from: Position, to: Position },
    /// `y = slope * x + intercept` across the whole canvas.
    Infinite { slope: f32, intercept: f32 },
}

/// Draws lines on a black canvas.
#[derive(Debug, Clone)]
pub struct Lines {
    pub size: Size,
    pub lines: Vec<LineSpec>,
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f32,
}

impl Lines {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            lines: Vec::new(),
            color: Color::GREEN,
            width: 1.0,
        }
    }
}

impl Operation for Lines {
    fn name(&self) -> &'static str {
        "Lines"
    }

    fn inputs(&self) -> usize {
        0
    }

    fn render(&mut self, _inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        let mut image = canvas(self.size, Color::BLACK)?;
        let color = self.color.to_rgba8();
        let strokes = self.width.max(1.0).round() as i32;

        for line in &self.lines {
            let (start, end) = match *line {
                LineSpec::Segment { from, to } => (from.to_pixel(self.size), to.to_pixel(self.size)),
                LineSpec::Infinite { slope, intercept } => (
                    Position::new(0.0, intercept).to_pixel(self.size),
                    Position::new(1.0, slope + intercept).to_pixel(self.size),
                ),
            };
            // Thick strokes are drawn as parallel offset lines.
            for offset in 0..strokes {
                let d = offset as f32 - (strokes - 1) as f32 / 2.0;
                draw_line_segment_mut(&mut image, (start.0, start.1 + d), (end.0, end.1 + d), color);
            }
        }
        Ok(image)
    }
}

// ============================================================================
// Crosshairs
// ============================================================================

/// Draws a plus-shaped mark at each position on a transparent canvas.
///
/// In tracking mode the unit takes one input, used only for the canvas size
/// and as the render trigger, and reads new positions from a channel.
#[derive(Debug)]
pub struct Crosshair {
    pub size: Size,
    pub positions: Vec<Position>,
    /// Mark size in pixels.
    pub width: f32,
    pub color: Color,
    feed: Option<Receiver<Vec<Position>>>,
}

impl Crosshair {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            positions: Vec::new(),
            width: 5.0,
            color: Color::GREEN,
            feed: None,
        }
    }

    /// A crosshair overlay that follows positions sent on `feed`.
    pub fn tracking(feed: Receiver<Vec<Position>>) -> Self {
        Self {
            feed: Some(feed),
            ..Self::new(Size::new(0, 0))
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.feed.is_some()
    }

    fn drain_feed(&mut self) {
        if let Some(feed) = &self.feed {
            // Only the most recent batch matters.
            if let Some(latest) = feed.try_iter().last() {
                self.positions = latest;
            }
        }
    }
}

impl Operation for Crosshair {
    fn name(&self) -> &'static str {
        "Crosshair"
    }

    fn inputs(&self) -> usize {
        if self.is_tracking() {
            1
        } else {
            0
        }
    }

    fn render(&mut self, inputs: &[Frame]) -> Result<RgbaImage, OperationError> {
        if self.is_tracking() {
            pixel::expect_inputs(self.name(), 1, inputs)?;
            self.size = inputs[0].size();
            self.drain_feed();
        }

        let mut image = canvas(self.size, Color::TRANSPARENT)?;
        let color = self.color.to_rgba8();
        let half = self.width.max(1.0) / 2.0;

        for position in &self.positions {
            let (x, y) = position.to_pixel(self.size);
            draw_line_segment_mut(&mut image, (x - half, y), (x + half, y), color);
            draw_line_segment_mut(&mut image, (x, y - half), (x, y + half), color);
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use image::Rgba;

    #[test]
    fn test_solid_color() {
        let mut unit = SolidColor::new(Size::new(3, 2), Color::RED);
        let image = unit.render(&[]).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_empty_canvas_fails() {
        let mut unit = SolidColor::new(Size::new(0, 4), Color::RED);
        assert!(matches!(unit.render(&[]), Err(OperationError::Failed { .. })));
    }

    #[test]
    fn test_circle_radius() {
        let mut unit = Circle::new(Size::new(20, 20));
        unit.color = Color::GREEN;
        unit.background = Color::RED;
        let empty = unit.render(&[]).unwrap();
        assert_eq!(empty.get_pixel(10, 10), &Rgba([255, 0, 0, 255]));

        unit.radius = 0.25;
        let drawn = unit.render(&[]).unwrap();
        assert_eq!(drawn.get_pixel(10, 10), &Rgba([0, 255, 0, 255]));
        assert_eq!(drawn.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_lines_draw_segment() {
        let mut unit = Lines::new(Size::new(10, 10));
        unit.lines = vec![LineSpec::Segment {
            from: Position::new(0.0, 0.5),
            to: Position::new(1.0, 0.5),
        }];
        let image = unit.render(&[]).unwrap();
        assert_eq!(image.get_pixel(5, 5), &Rgba([0, 255, 0, 255]));
        assert_eq!(image.get_pixel(5, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_crosshair_tracking() {
        let (tx, rx) = unbounded();
        let mut unit = Crosshair::tracking(rx);
        unit.color = Color::RED;
        assert_eq!(unit.inputs(), 1);

        let input = Frame::solid(Size::new(16, 16), Color::WHITE, 1);
        tx.send(vec![Position::new(0.0, 0.0)]).unwrap();
        tx.send(vec![Position::CENTER]).unwrap();

        let image = unit.render(&[input]).unwrap();
        assert_eq!(image.dimensions(), (16, 16));
        assert_eq!(image.get_pixel(8, 8), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(0, 15)[3], 0);
        assert_eq!(unit.positions, vec![Position::CENTER]);
    }
}
