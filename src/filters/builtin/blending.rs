//! Blend modes over a second bundled image.
//!
//! Every entry is wired the same way: the source image is the base (input 0),
//! the secondary image the overlay (input 1). The secondary image is pushed
//! once at wiring time and only the source is re-triggered afterwards.

use super::BLENDING_MODES;
use crate::core::error::CatalogError;
use crate::filters::catalog::{CatalogBuilder, CatalogContext};
use crate::filters::descriptor::FilterDescriptor;
use crate::operations::blend::{Blend, BlendMode};
use image::RgbaImage;
use std::sync::Arc;

fn description(mode: BlendMode) -> &'static str {
    match mode {
        BlendMode::ChromaKey => "Replaces the key color with the overlay",
        BlendMode::Dissolve => "Cross-fade",
        BlendMode::Multiply => "Multiply",
        BlendMode::Add => "Add",
        BlendMode::Subtract => "Subtract",
        BlendMode::Divide => "Divide",
        BlendMode::Overlay => "Overlay",
        BlendMode::Darken => "Per-channel minimum",
        BlendMode::Lighten => "Per-channel maximum",
        BlendMode::ColorBurn => "Color burn",
        BlendMode::ColorDodge => "Color dodge",
        BlendMode::Screen => "Screen",
        BlendMode::Exclusion => "Exclusion",
        BlendMode::Difference => "Difference",
        BlendMode::HardLight => "Hard light",
        BlendMode::SoftLight => "Soft light",
        BlendMode::Alpha => "Alpha-weighted mix",
        BlendMode::SourceOver => "Overlay composited over the base",
        BlendMode::Normal => "Normal",
        BlendMode::LinearBurn => "Linear burn",
        BlendMode::Color => "Color",
        BlendMode::Hue => "Hue",
        BlendMode::Saturation => "Saturation",
        BlendMode::Luminosity => "Luminosity",
    }
}

fn descriptor(mode: BlendMode, overlay: Arc<RgbaImage>) -> Result<FilterDescriptor, CatalogError> {
    let builder = FilterDescriptor::custom(mode.name(), move || Blend::new(mode))
        .wiring(move |ctx, _| {
            let second = ctx.add_source(overlay.clone(), "overlay");
            ctx.connect(ctx.source(), ctx.unit())?;
            ctx.connect(second, ctx.unit())?;
            ctx.connect(ctx.unit(), ctx.sink())?;
            ctx.push(second)
        })
        .description(description(mode));

    match mode {
        BlendMode::ChromaKey => builder
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.threshold_sensitivity = value)
            .build(),
        BlendMode::Dissolve | BlendMode::Alpha => builder
            .range(0.0, 1.0, 0.0)
            .on_change(|unit, value| unit.mix = value)
            .build(),
        _ => builder.build(),
    }
}

pub fn register(builder: &mut CatalogBuilder, ctx: &CatalogContext<'_>) {
    builder.category(BLENDING_MODES);
    for mode in BlendMode::ALL {
        match ctx.secondary_image(mode.name()) {
            Ok(overlay) => {
                builder.add(BLENDING_MODES, descriptor(mode, overlay));
            }
            Err(e) => builder.reject(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Color, Frame, Size};
    use crate::engine::{ImageEngine, RenderView, SoftwareEngine};
    use crate::pipeline::build_pipeline;
    use parking_lot::Mutex;

    fn solid(color: Color) -> Arc<RgbaImage> {
        Arc::new(Frame::solid(Size::new(4, 4), color, 0).image().clone())
    }

    fn blend_pixel(mode: BlendMode, base: Color, overlay: Color) -> [u8; 4] {
        let mut engine = SoftwareEngine::new();
        let view = Arc::new(Mutex::new(RenderView::new()));
        let sink = engine.add_sink(view.clone(), "view");
        let descriptor = Arc::new(descriptor(mode, solid(overlay)).unwrap());
        build_pipeline(&mut engine, descriptor, solid(base), sink).unwrap();
        let pixel = view.lock().latest().unwrap().image().get_pixel(1, 1).0;
        pixel
    }

    #[test]
    fn test_multiply_is_its_own_mode() {
        let gray = Color::rgb(0.5, 0.5, 0.5);
        let multiplied = blend_pixel(BlendMode::Multiply, gray, gray);
        assert!((multiplied[0] as i32 - 64).abs() <= 1);

        // Dissolve at its default mix of 0 keeps the base.
        let dissolved = blend_pixel(BlendMode::Dissolve, gray, Color::BLACK);
        assert_eq!(dissolved[0], 128);
    }

    #[test]
    fn test_base_is_the_source() {
        let pixel = blend_pixel(BlendMode::Subtract, Color::WHITE, Color::rgb(0.25, 0.25, 0.25));
        assert!((pixel[0] as i32 - 191).abs() <= 1);
    }

    #[test]
    fn test_adjustable_modes() {
        let adjustable: Vec<_> = BlendMode::ALL
            .into_iter()
            .filter(|&mode| descriptor(mode, solid(Color::BLACK)).unwrap().has_parameter_callback())
            .collect();
        assert_eq!(
            adjustable,
            vec![BlendMode::ChromaKey, BlendMode::Dissolve, BlendMode::Alpha]
        );
    }
}
