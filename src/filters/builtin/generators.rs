//! Generators: units that draw without an input image.

use super::GENERATORS;
use crate::core::types::{Color, Position};
use crate::filters::catalog::{CatalogBuilder, CatalogContext};
use crate::filters::descriptor::FilterDescriptor;
use crate::operations::generators::{Circle, Crosshair, LineSpec, Lines, SolidColor};

pub fn register(builder: &mut CatalogBuilder, ctx: &CatalogContext<'_>) {
    let canvas = ctx.canvas;
    builder.category(GENERATORS);

    builder.add(
        GENERATORS,
        FilterDescriptor::generator("LineGenerator", move || Lines {
            color: Color::GREEN,
            width: 2.0,
            ..Lines::new(canvas)
        })
        .on_change(|unit, value| {
            unit.lines = vec![
                LineSpec::Segment {
                    from: Position::new(value, value),
                    to: Position::CENTER,
                },
                LineSpec::Infinite {
                    slope: value,
                    intercept: value,
                },
            ];
        })
        .description("Draws a segment and a line")
        .build(),
    );

    builder.add(
        GENERATORS,
        FilterDescriptor::generator("SolidColorGenerator", move || {
            SolidColor::new(canvas, Color::RED)
        })
        .on_change(|unit, value| unit.color = Color::rgb(1.0, value * 2.0, value))
        .description("Fills the frame with one color")
        .build(),
    );

    builder.add(
        GENERATORS,
        FilterDescriptor::generator("CircleGenerator", move || Circle {
            color: Color::GREEN,
            background: Color::RED,
            ..Circle::new(canvas)
        })
        .on_change(|unit, value| unit.radius = value * 0.5)
        .description("Draws a filled circle")
        .build(),
    );

    builder.add(
        GENERATORS,
        FilterDescriptor::generator("CrosshairGenerator", move || {
            let mut unit = Crosshair::new(canvas);
            unit.width = 20.0;
            unit.color = Color::GREEN;
            unit
        })
        .on_change(|unit, value| {
            unit.positions = vec![
                Position::new(value, value),
                Position::new(value * 0.5, value),
                Position::new(value, value * 0.5),
            ];
        })
        .description("Draws crosshair marks")
        .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Size;
    use crate::engine::recording::{EngineCall, RecordingEngine};
    use crate::engine::{AssetLibrary, ImageEngine, RenderView};
    use crate::pipeline::{build_pipeline, on_control_changed};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn catalog_entry(name: &str) -> Arc<FilterDescriptor> {
        let assets = AssetLibrary::new();
        let ctx = CatalogContext::new(&assets, Size::new(16, 16));
        let mut builder = CatalogBuilder::new();
        register(&mut builder, &ctx);
        let report = builder.finish();
        report.catalog.find_in(GENERATORS, name).unwrap().clone()
    }

    #[test]
    fn test_solid_color_generator_ignores_source() {
        let mut engine = RecordingEngine::new();
        let view = Arc::new(Mutex::new(RenderView::new()));
        let sink = engine.add_sink(view.clone(), "view");
        let source = Arc::new(image::RgbaImage::new(4, 4));

        let mut pipeline =
            build_pipeline(&mut engine, catalog_entry("SolidColorGenerator"), source, sink)
                .unwrap();

        assert!(!engine
            .calls
            .iter()
            .any(|call| matches!(call, EngineCall::AddSource(_))));
        assert_eq!(view.lock().presented(), 1);
        // Default value 0: pure red.
        let first = view.lock().latest().unwrap().image().get_pixel(0, 0).0;
        assert_eq!(first, [255, 0, 0, 255]);

        on_control_changed(&mut engine, &mut pipeline, 0.5).unwrap();
        let second = view.lock().latest().unwrap().image().get_pixel(0, 0).0;
        assert_eq!(second[1], 255);
        assert_eq!(engine.triggers(), vec![pipeline.unit(), pipeline.unit()]);
    }

    #[test]
    fn test_generators_use_default_range() {
        let descriptor = catalog_entry("CircleGenerator");
        let range = descriptor.range().unwrap();
        assert_eq!((range.min, range.max, range.default), (0.0, 1.0, 0.0));
    }
}
