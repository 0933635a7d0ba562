//! Pixel helpers shared by the operations.

use crate::core::error::OperationError;
use crate::core::types::Frame;
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Rec. 709 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Check the number of input frames an operation received.
pub fn expect_inputs(
    operation: &'static str,
    expected: usize,
    inputs: &[Frame],
) -> Result<(), OperationError> {
    if inputs.len() != expected {
        return Err(OperationError::InputCount {
            operation,
            expected,
            got: inputs.len(),
        });
    }
    Ok(())
}

/// The single input frame of a one-input operation.
pub fn single_input<'a>(
    operation: &'static str,
    inputs: &'a [Frame],
) -> Result<&'a RgbaImage, OperationError> {
    expect_inputs(operation, 1, inputs)?;
    Ok(inputs[0].image())
}

#[inline]
pub fn to_unit(channel: u8) -> f32 {
    channel as f32 / 255.0
}

#[inline]
pub fn from_unit(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
pub fn unit_rgba(pixel: &Rgba<u8>) -> [f32; 4] {
    [
        to_unit(pixel[0]),
        to_unit(pixel[1]),
        to_unit(pixel[2]),
        to_unit(pixel[3]),
    ]
}

#[inline]
pub fn pack_rgba(color: [f32; 4]) -> Rgba<u8> {
    Rgba([
        from_unit(color[0]),
        from_unit(color[1]),
        from_unit(color[2]),
        from_unit(color[3]),
    ])
}

#[inline]
pub fn luminance(color: &[f32; 4]) -> f32 {
    color[0] * LUMA_WEIGHTS[0] + color[1] * LUMA_WEIGHTS[1] + color[2] * LUMA_WEIGHTS[2]
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Apply a function to every pixel in normalized RGBA.
pub fn map_pixels(image: &RgbaImage, f: impl Fn([f32; 4]) -> [f32; 4]) -> RgbaImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        *pixel = pack_rgba(f(unit_rgba(pixel)));
    }
    result
}

/// Like [`map_pixels`] with the pixel's normalized position, origin top-left.
pub fn map_pixels_at(
    image: &RgbaImage,
    f: impl Fn(f32, f32, [f32; 4]) -> [f32; 4],
) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut result = image.clone();
    for (x, y, pixel) in result.enumerate_pixels_mut() {
        let u = (x as f32 + 0.5) / width as f32;
        let v = (y as f32 + 0.5) / height as f32;
        *pixel = pack_rgba(f(u, v, unit_rgba(pixel)));
    }
    result
}

/// Pixel at clamped coordinates.
#[inline]
pub fn sample_clamped(image: &RgbaImage, x: i64, y: i64) -> &Rgba<u8> {
    let max_x = image.width().saturating_sub(1) as i64;
    let max_y = image.height().saturating_sub(1) as i64;
    image.get_pixel(x.clamp(0, max_x) as u32, y.clamp(0, max_y) as u32)
}

/// Nearest-neighbor sample at normalized coordinates.
pub fn sample_normalized(image: &RgbaImage, u: f32, v: f32) -> [f32; 4] {
    let x = (u * image.width() as f32).floor() as i64;
    let y = (v * image.height() as f32).floor() as i64;
    unit_rgba(sample_clamped(image, x, y))
}

/// Convolve the color channels with a row-major 3x3 kernel. Alpha is kept.
pub fn convolve3x3(image: &RgbaImage, kernel: &[f32; 9]) -> RgbaImage {
    let mut result = RgbaImage::new(image.width(), image.height());
    for (x, y, out) in result.enumerate_pixels_mut() {
        let mut sum = [0.0f32; 3];
        for ky in 0..3 {
            for kx in 0..3 {
                let weight = kernel[ky * 3 + kx];
                if weight == 0.0 {
                    continue;
                }
                let p = sample_clamped(image, x as i64 + kx as i64 - 1, y as i64 + ky as i64 - 1);
                for c in 0..3 {
                    sum[c] += weight * to_unit(p[c]);
                }
            }
        }
        let alpha = image.get_pixel(x, y)[3];
        *out = Rgba([from_unit(sum[0]), from_unit(sum[1]), from_unit(sum[2]), alpha]);
    }
    result
}

/// Luminance plane.
pub fn to_gray(image: &RgbaImage) -> GrayImage {
    let mut gray = GrayImage::new(image.width(), image.height());
    for (x, y, out) in gray.enumerate_pixels_mut() {
        let color = unit_rgba(image.get_pixel(x, y));
        *out = Luma([from_unit(luminance(&color))]);
    }
    gray
}

/// Expand a luminance plane to opaque RGBA.
pub fn gray_to_rgba(gray: &GrayImage) -> RgbaImage {
    let mut result = RgbaImage::new(gray.width(), gray.height());
    for (x, y, out) in result.enumerate_pixels_mut() {
        let v = gray.get_pixel(x, y)[0];
        *out = Rgba([v, v, v, 255]);
    }
    result
}

/// Fail with a readable error when an image is empty.
pub fn non_empty(operation: &'static str, image: &RgbaImage) -> Result<(), OperationError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(OperationError::Failed {
            operation,
            reason: "input frame is empty".to_string(),
        });
    }
    Ok(())
}

/// The single input of a unit that samples neighbors and needs at least one pixel.
pub fn non_empty_input<'a>(
    operation: &'static str,
    inputs: &'a [Frame],
) -> Result<&'a RgbaImage, OperationError> {
    let image = single_input(operation, inputs)?;
    non_empty(operation, image)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert_eq!(from_unit(to_unit(200)), 200);
        assert_eq!(from_unit(-1.0), 0);
        assert_eq!(from_unit(2.0), 255);
    }

    #[test]
    fn test_identity_kernel() {
        let image = RgbaImage::from_fn(4, 3, |x, y| Rgba([(x * 40) as u8, (y * 60) as u8, 7, 200]));
        let identity = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(convolve3x3(&image, &identity), image);
    }

    #[test]
    fn test_expect_inputs() {
        let result = expect_inputs("Blend", 2, &[]);
        assert_eq!(
            result,
            Err(OperationError::InputCount {
                operation: "Blend",
                expected: 2,
                got: 0
            })
        );
    }

    #[test]
    fn test_non_empty_input() {
        let empty = Frame::new(RgbaImage::new(0, 0), 1);
        assert!(matches!(
            non_empty_input("Median", &[empty]),
            Err(OperationError::Failed { operation: "Median", .. })
        ));
        let one = Frame::new(RgbaImage::new(1, 1), 1);
        assert_eq!(non_empty_input("Median", &[one]).unwrap().dimensions(), (1, 1));
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.2, 0.4, 0.0), 0.0);
        assert_eq!(smoothstep(0.2, 0.4, 1.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(smoothstep(0.5, 0.5, 0.6), 1.0);
    }
}
