//! The bundled catalog.
//!
//! Organized by category, in presentation order:
//! - Image generators
//! - Color adjustments
//! - Image processing
//! - Blending modes
//! - Visual effects

pub mod blending;
pub mod color;
pub mod effects;
pub mod generators;
pub mod processing;

use crate::filters::catalog::{CatalogBuilder, CatalogContext, CatalogReport};

pub const GENERATORS: &str = "Image generators";
pub const COLOR_ADJUSTMENTS: &str = "Color adjustments";
pub const IMAGE_PROCESSING: &str = "Image processing";
pub const BLENDING_MODES: &str = "Blending modes";
pub const VISUAL_EFFECTS: &str = "Visual effects";

/// Build the full catalog against the given assets.
///
/// Descriptors whose assets are missing are skipped and reported; the rest
/// of the catalog is unaffected.
pub fn build_catalog(ctx: &CatalogContext<'_>) -> CatalogReport {
    let mut builder = CatalogBuilder::new();
    generators::register(&mut builder, ctx);
    color::register(&mut builder, ctx);
    processing::register(&mut builder, ctx);
    blending::register(&mut builder, ctx);
    effects::register(&mut builder);
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{CatalogError, NodeId};
    use crate::core::types::{Color, FilterKind, Frame, Size};
    use crate::engine::{AssetLibrary, ImageEngine, RenderView, SoftwareEngine};
    use crate::filters::catalog::{AMATORKA_TABLE, MISS_ETIKATE_TABLE, SOFT_ELEGANCE_TABLES};
    use crate::pipeline::{build_pipeline, on_control_changed};
    use image::RgbaImage;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn assets() -> AssetLibrary {
        let flower = Frame::solid(Size::new(16, 16), Color::rgb(0.8, 0.2, 0.6), 0);
        let mut library = AssetLibrary::new()
            .with_image("Flower.jpg", flower.image().clone())
            .with_image("lookup.png", identity_lookup());
        for table in [AMATORKA_TABLE, MISS_ETIKATE_TABLE]
            .into_iter()
            .chain(SOFT_ELEGANCE_TABLES)
        {
            library.insert(table, identity_lookup());
        }
        library
    }

    fn identity_lookup() -> RgbaImage {
        RgbaImage::from_fn(512, 512, |x, y| {
            let blue = (y / 64) * 8 + x / 64;
            image::Rgba([
                ((x % 64) * 255 / 63) as u8,
                ((y % 64) * 255 / 63) as u8,
                (blue * 255 / 63) as u8,
                255,
            ])
        })
    }

    fn full() -> CatalogReport {
        let assets = assets();
        build_catalog(&CatalogContext::new(&assets, Size::new(24, 24)))
    }

    fn source() -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_fn(24, 24, |x, y| {
            image::Rgba([(x * 10) as u8, (y * 10) as u8, ((x + y) * 5) as u8, 255])
        }))
    }

    #[test]
    fn test_categories_in_order() {
        let report = full();
        assert!(report.rejected.is_empty(), "{:?}", report.rejected);
        let categories: Vec<_> = report.catalog.categories().collect();
        assert_eq!(
            categories,
            vec![
                GENERATORS,
                COLOR_ADJUSTMENTS,
                IMAGE_PROCESSING,
                BLENDING_MODES,
                VISUAL_EFFECTS
            ]
        );
        assert_eq!(report.catalog.entries(GENERATORS).len(), 4);
        assert_eq!(report.catalog.entries(COLOR_ADJUSTMENTS).len(), 29);
        assert_eq!(report.catalog.entries(IMAGE_PROCESSING).len(), 35);
        assert_eq!(report.catalog.entries(BLENDING_MODES).len(), 24);
        assert_eq!(report.catalog.entries(VISUAL_EFFECTS).len(), 22);
        assert_eq!(report.catalog.len(), 114);
    }

    #[test]
    fn test_ranges_are_valid() {
        let report = full();
        for (_, descriptor) in report.catalog.iter() {
            if let Some(range) = descriptor.range() {
                assert!(
                    range.min <= range.default && range.default <= range.max,
                    "{}",
                    descriptor.name()
                );
            }
        }
    }

    #[test]
    fn test_custom_iff_wiring() {
        let report = full();
        for (_, descriptor) in report.catalog.iter() {
            assert_eq!(
                descriptor.kind() == FilterKind::Custom,
                descriptor.has_custom_wiring(),
                "{}",
                descriptor.name()
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let first: Vec<_> = full().catalog.summaries();
        let second: Vec<_> = full().catalog.summaries();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_entries() {
        let report = full();
        let catalog = &report.catalog;
        let kind = |name: &str| catalog.find(name).map(|(_, d)| d.kind());

        assert_eq!(kind("BilateralBlur"), Some(FilterKind::LinearChain));
        assert_eq!(kind("Convolution3x3"), Some(FilterKind::LinearChain));
        assert_eq!(kind("Histogram"), Some(FilterKind::Custom));
        assert_eq!(kind("UnsharpMask"), Some(FilterKind::CompositeGroup));
        assert_eq!(kind("SolidColorGenerator"), Some(FilterKind::Generator));
        assert_eq!(kind("NobleCornerDetector"), Some(FilterKind::Custom));
        assert_eq!(kind("ShiTomasiFeatureDetector"), Some(FilterKind::Custom));
        assert_eq!(kind("SoftElegance"), Some(FilterKind::CompositeGroup));
        assert_eq!(kind("KuwaharaRadius3Filter"), Some(FilterKind::LinearChain));
    }

    #[test]
    fn test_missing_assets_skip_only_their_entries() {
        let assets = AssetLibrary::new();
        let report = build_catalog(&CatalogContext::new(&assets, Size::new(8, 8)));

        assert!(report.catalog.find("LookupFilter").is_none());
        assert!(report.catalog.find("ChromaKeying").is_none());
        assert!(report.catalog.find("AddBlend").is_none());
        assert!(report.catalog.find("BrightnessAdjustment").is_some());
        assert!(report.catalog.entries(BLENDING_MODES).is_empty());
        assert!(report
            .rejected
            .iter()
            .all(|e| matches!(e, CatalogError::AssetMissing { .. })));
        // Four lookup-table entries, chroma keying and every blend mode.
        assert_eq!(report.rejected.len(), 29);
        assert!(!report.catalog.categories().any(|c| c == BLENDING_MODES));
    }

    #[test]
    fn test_every_entry_renders_one_frame() {
        let report = full();
        for (_, descriptor) in report.catalog.iter() {
            let mut engine = SoftwareEngine::new();
            let view = Arc::new(Mutex::new(RenderView::new()));
            let sink: NodeId = engine.add_sink(view.clone(), "view");

            let pipeline = build_pipeline(&mut engine, descriptor.clone(), source(), sink)
                .unwrap_or_else(|e| panic!("{}: {}", descriptor.name(), e));
            assert_eq!(view.lock().presented(), 1, "{}", descriptor.name());

            pipeline.tear_down(&mut engine).unwrap();
            assert_eq!(engine.graph().node_count(), 1, "{}", descriptor.name());
        }
    }

    #[test]
    fn test_every_control_renders_at_its_extremes() {
        let report = full();
        for (_, descriptor) in report.catalog.iter() {
            let Some(range) = descriptor.range().filter(|_| descriptor.has_parameter_callback())
            else {
                continue;
            };
            let mut engine = SoftwareEngine::new();
            let view = Arc::new(Mutex::new(RenderView::new()));
            let sink: NodeId = engine.add_sink(view.clone(), "view");
            let mut pipeline =
                build_pipeline(&mut engine, descriptor.clone(), source(), sink).unwrap();

            for value in [range.min, range.max] {
                on_control_changed(&mut engine, &mut pipeline, value)
                    .unwrap_or_else(|e| panic!("{} at {}: {}", descriptor.name(), value, e));
            }
            assert_eq!(view.lock().presented(), 3, "{}", descriptor.name());
            pipeline.tear_down(&mut engine).unwrap();
        }
    }

    #[test]
    fn test_empty_source_fails_without_panicking() {
        let report = full();
        let empty = Arc::new(RgbaImage::new(0, 0));
        for (_, descriptor) in report.catalog.iter() {
            let mut engine = SoftwareEngine::new();
            let view = Arc::new(Mutex::new(RenderView::new()));
            let sink: NodeId = engine.add_sink(view.clone(), "view");

            // Either outcome is acceptable; reaching the next entry is the point.
            if let Ok(pipeline) = build_pipeline(&mut engine, descriptor.clone(), empty.clone(), sink)
            {
                pipeline.tear_down(&mut engine).unwrap();
            }
        }
    }
}
