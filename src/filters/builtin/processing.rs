//! Image processing: geometry, kernels, blurs, edges and detectors.

use super::IMAGE_PROCESSING;
use crate::core::error::EngineResult;
use crate::core::types::Color;
use crate::engine::UnitHandle;
use crate::filters::catalog::{CatalogBuilder, CatalogContext};
use crate::filters::descriptor::FilterDescriptor;
use crate::operations::blend::{Blend, BlendMode};
use crate::operations::detection::{CornerDetector, CornerResponse, Histogram, HistogramDisplay};
use crate::operations::generators::Crosshair;
use crate::operations::groups::{
    CannyEdgeDetection, ColourFast, HighPass, HistogramEqualization, IosBlur, LowPass,
    MorphologyPair, MotionDetector, TiltShift, UnsharpMask,
};
use crate::operations::processing::{
    BilateralBlur, BoxBlur, Convolution3x3, Crop, EdgeDetection, GaussianBlur, LanczosResampling,
    LocalBinaryPattern, MedianFilter, MorphologyFilter, MotionBlur, Sharpen,
    SingleComponentGaussianBlur, ThresholdEdgeDetection, Transform, ZoomBlur,
};
use crate::pipeline::WiringContext;
use crossbeam::channel;
use std::f32::consts::PI;

/// Feeds detected corners to a crosshair overlay blended over the source.
fn track_corners(
    ctx: &mut WiringContext<'_>,
    detector: &UnitHandle<CornerDetector>,
) -> EngineResult<()> {
    let (corners, feed) = channel::unbounded();
    detector.lock().notify(corners);

    let mut marks = Crosshair::tracking(feed);
    marks.width = 15.0;
    marks.color = Color::RED;
    let (overlay, _) = ctx.add_unit(marks, "crosshairs");
    let (blend, _) = ctx.add_unit(Blend::new(BlendMode::Alpha), "blend");

    ctx.connect(ctx.source(), ctx.unit())?;
    ctx.connect(ctx.unit(), overlay)?;
    ctx.connect(ctx.source(), blend)?;
    ctx.connect(overlay, blend)?;
    ctx.connect(blend, ctx.sink())
}

pub fn register(builder: &mut CatalogBuilder, ctx: &CatalogContext<'_>) {
    let p = IMAGE_PROCESSING;
    let canvas = ctx.canvas;
    builder.category(p);

    builder.add(
        p,
        FilterDescriptor::linear("TransformOperation", Transform::default)
            .range(0.0, PI, 0.0)
            .on_change(|unit, value| unit.angle = value)
            .description("Rotation about the center")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("Crop", Crop::default)
            .range(0.1, 1.0, 1.0)
            .on_change(|unit, value| unit.height_fraction = value)
            .description("Centered crop")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("LanczosResampling", LanczosResampling::default)
            .description("Lanczos downsampling to half size")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("Sharpen", Sharpen::default)
            .range(-4.0, 4.0, 0.0)
            .on_change(|unit, value| unit.sharpness = value)
            .description("Sharpen")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::custom("Histogram", Histogram::default)
            .range(1.0, 32.0, 16.0)
            .on_change(|unit, value| unit.downsampling = value.round().max(1.0) as u32)
            .wiring(move |ctx, _| {
                let (display, _) = ctx.add_unit(HistogramDisplay::new(canvas), "display");
                let (blend, _) = ctx.add_unit(Blend::new(BlendMode::Alpha).with_mix(0.5), "blend");
                ctx.connect(ctx.source(), blend)?;
                ctx.connect(ctx.source(), ctx.unit())?;
                ctx.connect(ctx.unit(), display)?;
                ctx.connect(display, blend)?;
                ctx.connect(blend, ctx.sink())
            })
            .description("Color histogram drawn over the image")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("HistogramDisplay", move || HistogramDisplay::new(canvas))
            .description("First image row drawn as histogram bars")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("MotionBlur", MotionBlur::default)
            .range(0.0, 10.0, 0.0)
            .on_change(|unit, value| unit.blur_size = value)
            .description("Directional blur")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("ZoomBlur", ZoomBlur::default)
            .range(0.0, 10.0, 0.0)
            .on_change(|unit, value| unit.blur_size = value)
            .description("Radial blur from the center")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("GaussianBlur", || GaussianBlur::new(0.0))
            .range(0.0, 5.0, 0.0)
            .on_change(|unit, value| unit.sigma = value)
            .description("Gaussian blur")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("BoxBlur", BoxBlur::default)
            .range(0.0, 5.0, 0.0)
            .on_change(|unit, value| unit.radius = value)
            .description("Box blur")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("SingleComponentGaussianBlur", SingleComponentGaussianBlur::default)
            .range(0.5, 5.0, 0.5)
            .on_change(|unit, value| unit.sigma = value)
            .description("Gaussian blur of luminance")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("BilateralBlur", BilateralBlur::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.distance_normalization_factor = value)
            .description("Edge-preserving blur")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("Dilation", MorphologyFilter::dilation)
            .description("Channel-wise maximum")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("Erosion", MorphologyFilter::erosion)
            .description("Channel-wise minimum")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("MedianFilter", || MedianFilter)
            .description("3x3 median per channel")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("Convolution3x3", || {
            Convolution3x3::new(Convolution3x3::SOBEL_HORIZONTAL)
        })
        .description("Fixed 3x3 kernel")
        .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("SobelEdgeDetection", EdgeDetection::sobel)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| unit.edge_strength = value)
            .description("Sobel edge detection")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("PrewittEdgeDetection", EdgeDetection::prewitt)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| unit.edge_strength = value)
            .description("Prewitt edge detection")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("ThresholdSobelEdgeDetection", ThresholdEdgeDetection::default)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| unit.edges.edge_strength = value)
            .description("Binary Sobel edges")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("LocalBinaryPattern", LocalBinaryPattern::default)
            .description("Neighbor comparison codes on luminance")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::linear("ColorLocalBinaryPattern", LocalBinaryPattern::color)
            .description("Neighbor comparison codes per channel")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("UnsharpMask", UnsharpMask::default)
            .range(0.0, 10.0, 0.0)
            .on_change(|unit, value| unit.intensity = value)
            .description("Unsharp mask")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("iOSBlur", IosBlur::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.blur_radius = value * 100.0)
            .description("Frosted-glass blur")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("TiltShift", TiltShift::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.blur.sigma = value * 10.0)
            .description("Sharp band with blurred surroundings")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("HistogramEqualization", || HistogramEqualization)
            .description("Per-channel histogram equalization")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("CannyEdgeDetection", CannyEdgeDetection::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.blur_radius = value * 10.0)
            .description("Canny edge detection")
            .build(),
    );

    let detectors = [
        ("HarrisCornerDetector", CornerResponse::Harris, "Harris corners with crosshair marks"),
        ("NobleCornerDetector", CornerResponse::Noble, "Noble corners with crosshair marks"),
        (
            "ShiTomasiFeatureDetector",
            CornerResponse::ShiTomasi,
            "Shi-Tomasi features with crosshair marks",
        ),
    ];
    for (name, response, description) in detectors {
        builder.add(
            p,
            FilterDescriptor::custom(name, move || CornerDetector::new(response))
                .range(0.0, 1.0, 0.0)
                .on_change(|unit, value| unit.threshold = value)
                .wiring(track_corners)
                .description(description)
                .build(),
        );
    }

    builder.add(
        p,
        FilterDescriptor::group("OpeningFilter", MorphologyPair::opening)
            .description("Erosion followed by dilation")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("ClosingFilter", MorphologyPair::closing)
            .description("Dilation followed by erosion")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("LowPassFilter", LowPass::default)
            .range(0.0, 1.0, 0.5)
            .on_change(|unit, value| unit.strength = value)
            .description("Temporal low-pass over successive frames")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("HighPassFilter", HighPass::default)
            .range(0.0, 1.0, 0.5)
            .on_change(|unit, value| unit.low_pass.strength = value)
            .description("Change against the low-passed history")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("MotionDetector", MotionDetector::default)
            .range(0.0, 1.0, 0.5)
            .on_change(|unit, value| unit.low_pass.strength = value)
            .description("Motion mask with intensity and centroid")
            .build(),
    );

    builder.add(
        p,
        FilterDescriptor::group("ColourFASTFeatureDetection", ColourFast::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.blur_radius = value)
            .description("Colour FAST feature descriptors")
            .build(),
    );
}
