//! Color adjustments.

use super::COLOR_ADJUSTMENTS;
use crate::core::types::Color;
use crate::filters::catalog::{
    CatalogBuilder, CatalogContext, AMATORKA_TABLE, MISS_ETIKATE_TABLE, SOFT_ELEGANCE_TABLES,
};
use crate::filters::descriptor::FilterDescriptor;
use crate::operations::blend::{Blend, BlendMode};
use crate::operations::color::{
    Brightness, ChromaKeying, ColorInversion, ColorMatrix, Contrast, Exposure, FalseColor, Gamma,
    Haze, HighlightAndShadowTint, HighlightsAndShadows, Hue, Levels, Lookup, LuminanceThreshold,
    Monochrome, Opacity, RgbAdjustment, Saturation, Vibrance, WhiteBalance,
};
use crate::operations::detection::{AverageColor, AverageLuminance};
use crate::operations::groups::{AdaptiveThreshold, AverageLuminanceThreshold, SoftElegance};

const COLOR_MATRIX: [f32; 16] = [
    0.2, 0.3, 0.5, 0.0, //
    0.1, 0.4, 0.5, 0.0, //
    0.3, 0.7, 0.9, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

pub fn register(builder: &mut CatalogBuilder, ctx: &CatalogContext<'_>) {
    let c = COLOR_ADJUSTMENTS;
    builder.category(c);

    builder.add(
        c,
        FilterDescriptor::linear("BrightnessAdjustment", Brightness::default)
            .range(-1.0, 1.0, 0.0)
            .on_change(|unit, value| unit.brightness = value)
            .description("Brightness")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("ExposureAdjustment", Exposure::default)
            .range(-10.0, 10.0, 0.0)
            .on_change(|unit, value| unit.exposure = value)
            .description("Exposure in stops")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("ContrastAdjustment", Contrast::default)
            .range(0.0, 4.0, 1.0)
            .on_change(|unit, value| unit.contrast = value)
            .description("Contrast")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("SaturationAdjustment", Saturation::default)
            .range(0.0, 2.0, 1.0)
            .on_change(|unit, value| unit.saturation = value)
            .description("Saturation")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("GammaAdjustment", Gamma::default)
            .range(0.0, 3.0, 1.0)
            .on_change(|unit, value| unit.gamma = value)
            .description("Gamma curve")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("LevelsAdjustment", Levels::default)
            .range(0.0, 1.0, 0.5)
            .on_change(|unit, value| {
                let floor = Color::rgb(value, 0.0, 0.0);
                unit.minimum = floor;
                unit.min_output = floor;
            })
            .description("Input and output levels")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("ColorMatrixFilter", || ColorMatrix::new(COLOR_MATRIX))
            .range(0.0, 2.0, 1.0)
            .on_change(|unit, value| unit.intensity = value)
            .description("4x4 color matrix transform")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("RGBAdjustment", RgbAdjustment::default)
            .range(0.0, 10.0, 1.0)
            .on_change(|unit, value| unit.green = value)
            .description("Per-channel gain, green channel")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("HueAdjustment", Hue::default)
            .range(0.0, 180.0, 90.0)
            .on_change(|unit, value| unit.hue = value)
            .description("Hue rotation in degrees")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("WhiteBalance", WhiteBalance::default)
            .range(-1.5, 1.5, 0.0)
            .on_change(|unit, value| {
                unit.temperature = (value + 5.5) * 1000.0;
                unit.tint = value;
            })
            .description("Color temperature and tint")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("HighlightsAndShadows", HighlightsAndShadows::default)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| {
                unit.shadows = value;
                unit.highlights = 1.0 - value;
            })
            .description("Lifted shadows and softened highlights")
            .build(),
    );

    match ctx.lookup_table("LookupFilter") {
        Ok(table) => {
            builder.add(
                c,
                FilterDescriptor::linear("LookupFilter", move || Lookup::new(table.clone()))
                    .range(0.0, 1.0, 0.0)
                    .on_change(|unit, value| unit.intensity = value)
                    .description("Color lookup table")
                    .build(),
            );
        }
        Err(e) => builder.reject(e),
    }

    for (name, asset, description) in [
        ("AmatorkaFilter", AMATORKA_TABLE, "Amatorka color grade"),
        ("MissEtikateFilter", MISS_ETIKATE_TABLE, "Miss Etikate color grade"),
    ] {
        match ctx.table(name, asset) {
            Ok(table) => {
                builder.add(
                    c,
                    FilterDescriptor::linear(name, move || Lookup::new(table.clone()))
                        .range(0.0, 1.0, 0.0)
                        .on_change(|unit, value| unit.intensity = value)
                        .description(description)
                        .build(),
                );
            }
            Err(e) => builder.reject(e),
        }
    }

    builder.add(
        c,
        FilterDescriptor::linear("ColorInversion", || ColorInversion)
            .description("Inverted colors")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("MonochromeFilter", Monochrome::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.intensity = value)
            .description("Single tint")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("FalseColor", FalseColor::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.second = Color::rgb(value, value, value))
            .description("Luminance mapped between two colors")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("Haze", Haze::default)
            .range(-0.3, 0.3, 0.0)
            .on_change(|unit, value| {
                unit.distance = value;
                unit.slope = value;
            })
            .description("Adds or removes haze")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("SepiaToneFilter", ColorMatrix::sepia)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.intensity = value)
            .description("Sepia tone")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("OpacityAdjustment", Opacity::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.opacity = value)
            .description("Alpha channel")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("LuminanceThreshold", LuminanceThreshold::default)
            .range(0.0, 1.0, 0.5)
            .on_change(|unit, value| unit.threshold = value)
            .description("Black or white by luminance")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("AverageColorExtractor", AverageColor::default)
            .description("Frame filled with its mean color")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("AverageLuminanceExtractor", AverageLuminance::default)
            .description("Frame filled with its mean luminance")
            .build(),
    );

    match ctx.secondary_image("ChromaKeying") {
        Ok(background) => {
            builder.add(
                c,
                FilterDescriptor::custom("ChromaKeying", ChromaKeying::default)
                    .range(0.0, 1.0, 0.5)
                    .on_change(|unit, value| unit.smoothing = value)
                    .wiring(move |ctx, _| {
                        let behind = ctx.add_source(background.clone(), "background");
                        let (blend, _) =
                            ctx.add_unit(Blend::new(BlendMode::Alpha).with_mix(1.0), "blend");
                        ctx.connect(behind, blend)?;
                        ctx.connect(ctx.source(), ctx.unit())?;
                        ctx.connect(ctx.unit(), blend)?;
                        ctx.connect(blend, ctx.sink())?;
                        ctx.push(behind)
                    })
                    .description("Green screen keyed over a background image")
                    .build(),
            );
        }
        Err(e) => builder.reject(e),
    }

    builder.add(
        c,
        FilterDescriptor::linear("Vibrance", Vibrance::default)
            .range(-1.2, 1.2, 0.0)
            .on_change(|unit, value| unit.vibrance = value)
            .description("Saturation weighted toward muted colors")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::linear("HighlightAndShadowTint", HighlightAndShadowTint::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| {
                unit.shadow_tint_intensity = value;
                unit.highlight_tint_intensity = value;
            })
            .description("Red shadows and blue highlights")
            .build(),
    );

    let [first, second] = SOFT_ELEGANCE_TABLES;
    match ctx
        .table("SoftElegance", first)
        .and_then(|a| ctx.table("SoftElegance", second).map(|b| (a, b)))
    {
        Ok((first, second)) => {
            builder.add(
                c,
                FilterDescriptor::group("SoftElegance", move || {
                    SoftElegance::new(first.clone(), second.clone())
                })
                .description("Two-table grade with a soft glow")
                .build(),
            );
        }
        Err(e) => builder.reject(e),
    }

    builder.add(
        c,
        FilterDescriptor::group("AdaptiveThreshold", AdaptiveThreshold::default)
            .description("Threshold against the local mean")
            .build(),
    );

    builder.add(
        c,
        FilterDescriptor::group("AverageLuminanceThreshold", AverageLuminanceThreshold::default)
            .description("Threshold against the mean luminance")
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Frame, Size};
    use crate::engine::{AssetLibrary, ImageEngine, RenderView, SoftwareEngine};
    use crate::pipeline::{build_pipeline, on_control_changed};
    use image::RgbaImage;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_chroma_keying_over_background() {
        let background = Frame::solid(Size::new(8, 8), Color::RED, 0);
        let assets = AssetLibrary::new().with_image("Flower.jpg", background.image().clone());
        let ctx = CatalogContext::new(&assets, Size::new(8, 8));
        let mut builder = CatalogBuilder::new();
        register(&mut builder, &ctx);
        let report = builder.finish();
        // Only the lookup tables are missing.
        let rejected: Vec<&str> = report.rejected.iter().map(|e| e.descriptor()).collect();
        assert_eq!(
            rejected,
            ["LookupFilter", "AmatorkaFilter", "MissEtikateFilter", "SoftElegance"]
        );
        let descriptor = report.catalog.find("ChromaKeying").unwrap().1.clone();

        let mut engine = SoftwareEngine::new();
        let view = Arc::new(Mutex::new(RenderView::new()));
        let sink = engine.add_sink(view.clone(), "view");
        let green: Arc<RgbaImage> =
            Arc::new(Frame::solid(Size::new(8, 8), Color::GREEN, 0).image().clone());

        let mut pipeline = build_pipeline(&mut engine, descriptor, green, sink).unwrap();
        assert_eq!(pipeline.extra_sources().len(), 1);
        assert_eq!(pipeline.extra_units().len(), 1);
        // Two pushes: the background once, the source once.
        assert_eq!(pipeline.triggers(), 2);
        assert_eq!(view.lock().presented(), 1);

        // Pure key color is removed, so the background shows through.
        let pixel = view.lock().latest().unwrap().image().get_pixel(4, 4).0;
        assert_eq!(pixel[0], 255);
        assert_eq!(pixel[1], 0);

        on_control_changed(&mut engine, &mut pipeline, 0.2).unwrap();
        assert_eq!(view.lock().presented(), 2);
        assert_eq!(view.lock().history(), &[2, 3]);
    }
}
