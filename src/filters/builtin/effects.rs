//! Visual effects.

use super::VISUAL_EFFECTS;
use crate::core::types::{Color, Position};
use crate::filters::catalog::CatalogBuilder;
use crate::filters::descriptor::FilterDescriptor;
use crate::operations::effects::{
    Bulge, CgaColorspace, Crosshatch, Emboss, Halftone, Kuwahara, Pinch, Pixellate, PolarPixellate,
    PolkaDot, Posterize, SmoothToon, SphereRefraction, Sketch, Solarize, Stretch, Swirl,
    ThresholdSketch, Toon, Vignette,
};

pub fn register(builder: &mut CatalogBuilder) {
    let v = VISUAL_EFFECTS;
    builder.category(v);

    builder.add(
        v,
        FilterDescriptor::linear("Pixellate", Pixellate::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.fraction = value)
            .description("Pixellation")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("PolarPixellate", PolarPixellate::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.center = Position::new(value, value))
            .description("Pixellation in polar coordinates")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("PolkaDot", PolkaDot::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.fraction = value)
            .description("Colored dots")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("Halftone", Halftone::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.fraction = value)
            .description("Black halftone dots")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("Crosshatch", Crosshatch::default)
            .range(0.0, 1.0, 0.5)
            .on_change(|unit, value| unit.spacing = value)
            .description("Hatching by darkness")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("SketchFilter", Sketch::default)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| unit.edges.edge_strength = value)
            .description("Pencil sketch")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("ThresholdSketchFilter", ThresholdSketch::default)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| unit.edges.edges.edge_strength = value)
            .description("Thresholded pencil sketch")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("ToonFilter", Toon::default)
            .range(0.0, 1.0, 1.0)
            .on_change(|unit, value| unit.threshold = value)
            .description("Cartoon outlines")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("SmoothToonFilter", SmoothToon::default)
            .range(0.0, 10.0, 1.0)
            .on_change(|unit, value| unit.blur.sigma = value)
            .description("Cartoon outlines on a smoothed frame")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("EmbossFilter", Emboss::default)
            .range(0.0, 4.0, 0.0)
            .on_change(|unit, value| unit.intensity = value)
            .description("Emboss")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("Posterize", Posterize::default)
            .range(1.0, 256.0, 1.0)
            .on_change(|unit, value| unit.levels = value)
            .description("Reduces each channel to a few levels")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("SwirlDistortion", Swirl::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.radius = value)
            .description("Swirl distortion")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("BulgeDistortion", Bulge::default)
            .range(-1.0, 1.0, 0.0)
            .on_change(|unit, value| unit.scale = value)
            .description("Bulge distortion")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("PinchDistortion", Pinch::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| {
                unit.center = Position::new(value, value);
                unit.scale = -2.0;
                unit.radius = 0.2;
            })
            .description("Pinch distortion")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("StretchDistortion", Stretch::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.center = Position::new(value, value))
            .description("Stretch distortion")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("SphereRefraction", SphereRefraction::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.refractive_index = value)
            .description("Refracting sphere")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("GlassSphereRefraction", SphereRefraction::glass)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.refractive_index = value)
            .description("Glass sphere with an upright image")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("Vignette", Vignette::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.color = Color::rgb(value, value, 0.0))
            .description("Darkened edges")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("KuwaharaFilter", Kuwahara::default)
            .range(0.0, 10.0, 0.0)
            .on_change(|unit, value| unit.radius = value.max(0.0) as u32)
            .description("Oil painting")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("KuwaharaRadius3Filter", || Kuwahara { radius: 3 })
            .description("Oil painting with a fixed radius")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("CGAColorspaceFilter", || CgaColorspace)
            .description("Four-color CGA palette")
            .build(),
    );

    builder.add(
        v,
        FilterDescriptor::linear("Solarize", Solarize::default)
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.threshold = value)
            .description("Inverts the bright parts")
            .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effects_order() {
        let mut builder = CatalogBuilder::new();
        register(&mut builder);
        let report = builder.finish();
        let names: Vec<_> = report
            .catalog
            .entries(VISUAL_EFFECTS)
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("Pixellate"));
        assert_eq!(names.last().map(String::as_str), Some("Solarize"));
        assert_eq!(names.len(), 22);
        assert_eq!(names[1], "PolarPixellate");
        assert_eq!(names[19], "KuwaharaRadius3Filter");
        let cga = report.catalog.find("CGAColorspaceFilter").unwrap().1;
        assert!(!cga.has_parameter_callback());
        assert!(cga.range().is_none());
    }
}
