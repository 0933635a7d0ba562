//! The filter catalog: categories of descriptors in presentation order.

use crate::core::config::BrowserConfig;
use crate::core::error::{AssetError, CatalogError};
use crate::core::types::{FilterKind, ParameterRange, Size};
use crate::engine::AssetLibrary;
use crate::filters::descriptor::FilterDescriptor;
use image::RgbaImage;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Read-only catalog of filter descriptors grouped by category.
///
/// Category order and entry order within a category are presentation order.
#[derive(Debug, Default)]
pub struct FilterCatalog {
    categories: IndexMap<String, Vec<Arc<FilterDescriptor>>>,
}

impl FilterCatalog {
    /// Category names in order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|s| s.as_str())
    }

    /// Entries of one category, in order.
    pub fn entries(&self, category: &str) -> &[Arc<FilterDescriptor>] {
        self.categories
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Entry by section and row.
    pub fn get(&self, section: usize, row: usize) -> Option<&Arc<FilterDescriptor>> {
        self.categories
            .get_index(section)
            .and_then(|(_, entries)| entries.get(row))
    }

    /// First entry with this name, with its category.
    pub fn find(&self, name: &str) -> Option<(&str, &Arc<FilterDescriptor>)> {
        self.iter().find(|(_, d)| d.name() == name)
    }

    /// Entry by category and name.
    pub fn find_in(&self, category: &str, name: &str) -> Option<&Arc<FilterDescriptor>> {
        self.entries(category).iter().find(|d| d.name() == name)
    }

    /// Section and row of the first entry with this name.
    pub fn locate(&self, name: &str) -> Option<(usize, usize)> {
        self.categories
            .values()
            .enumerate()
            .find_map(|(section, entries)| {
                entries
                    .iter()
                    .position(|d| d.name() == name)
                    .map(|row| (section, row))
            })
    }

    /// All entries with their category, in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<FilterDescriptor>)> {
        self.categories
            .iter()
            .flat_map(|(category, entries)| entries.iter().map(move |d| (category.as_str(), d)))
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Case-insensitive search over names and descriptions.
    pub fn search(&self, query: &str) -> Vec<(&str, &Arc<FilterDescriptor>)> {
        let query = query.to_lowercase();
        self.iter()
            .filter(|(_, d)| {
                let name_match = d.name().to_lowercase().contains(&query);
                let desc_match = d
                    .description()
                    .map(|text| text.to_lowercase().contains(&query))
                    .unwrap_or(false);
                name_match || desc_match
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<DescriptorSummary> {
        self.iter()
            .map(|(category, d)| DescriptorSummary::new(category, d))
            .collect()
    }
}

/// Serializable view of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorSummary {
    pub category: String,
    pub name: String,
    pub kind: FilterKind,
    pub range: Option<ParameterRange>,
    pub adjustable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DescriptorSummary {
    pub fn new(category: &str, descriptor: &FilterDescriptor) -> Self {
        Self {
            category: category.to_string(),
            name: descriptor.name().to_string(),
            kind: descriptor.kind(),
            range: descriptor.range(),
            adjustable: descriptor.has_parameter_callback(),
            description: descriptor.description().map(str::to_string),
        }
    }
}

// ============================================================================
// Building
// ============================================================================

/// Result of building a catalog: what made it in and what was rejected.
#[derive(Debug, Default)]
pub struct CatalogReport {
    pub catalog: FilterCatalog,
    pub rejected: Vec<CatalogError>,
}

/// Accumulates descriptors, rejecting bad ones with a diagnostic.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    categories: IndexMap<String, Vec<Arc<FilterDescriptor>>>,
    rejected: Vec<CatalogError>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a category so it keeps its position even if it ends up empty.
    pub fn category(&mut self, name: &str) -> &mut Self {
        self.categories.entry(name.to_string()).or_default();
        self
    }

    /// Add a built descriptor, or record why it could not be built.
    pub fn add(
        &mut self,
        category: &str,
        descriptor: Result<FilterDescriptor, CatalogError>,
    ) -> &mut Self {
        let result = descriptor.and_then(|d| {
            let duplicate = self
                .categories
                .get(category)
                .is_some_and(|entries| entries.iter().any(|e| e.name() == d.name()));
            if duplicate {
                Err(CatalogError::DuplicateName {
                    category: category.to_string(),
                    descriptor: d.name().to_string(),
                })
            } else {
                Ok(d)
            }
        });

        match result {
            Ok(d) => {
                self.categories
                    .entry(category.to_string())
                    .or_default()
                    .push(Arc::new(d));
            }
            Err(e) => self.reject(e),
        }
        self
    }

    /// Record a descriptor that was skipped before it could be built.
    pub fn reject(&mut self, error: CatalogError) {
        if error.is_contract_violation() {
            log::error!("{}", error);
        } else {
            log::warn!("{}", error);
        }
        self.rejected.push(error);
    }

    /// Finish the catalog. Categories with no entries are dropped.
    pub fn finish(self) -> CatalogReport {
        let categories: IndexMap<_, _> = self
            .categories
            .into_iter()
            .filter(|(_, entries)| !entries.is_empty())
            .collect();
        let catalog = FilterCatalog { categories };
        log::info!(
            "Catalog built: {} filter(s) in {} categories, {} rejected",
            catalog.len(),
            catalog.categories.len(),
            self.rejected.len()
        );
        CatalogReport {
            catalog,
            rejected: self.rejected,
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Side length of a color lookup table image.
pub const LOOKUP_TABLE_SIZE: u32 = 512;

/// Lookup tables behind the preset color grades.
pub const AMATORKA_TABLE: &str = "lookup_amatorka.png";
pub const MISS_ETIKATE_TABLE: &str = "lookup_miss_etikate.png";
pub const SOFT_ELEGANCE_TABLES: [&str; 2] =
    ["lookup_soft_elegance_1.png", "lookup_soft_elegance_2.png"];

/// What descriptor factories need from outside: bundled images and the canvas.
pub struct CatalogContext<'a> {
    pub assets: &'a AssetLibrary,
    /// Size of generator output.
    pub canvas: Size,
    /// Second image fed to blends.
    pub secondary: String,
    /// Color lookup table image.
    pub lookup: String,
}

impl<'a> CatalogContext<'a> {
    pub fn new(assets: &'a AssetLibrary, canvas: Size) -> Self {
        let defaults = BrowserConfig::default();
        Self {
            assets,
            canvas,
            secondary: defaults.assets.secondary,
            lookup: defaults.assets.lookup,
        }
    }

    pub fn from_config(assets: &'a AssetLibrary, config: &BrowserConfig) -> Self {
        Self {
            assets,
            canvas: config.display.canvas(),
            secondary: config.assets.secondary.clone(),
            lookup: config.assets.lookup.clone(),
        }
    }

    /// Load a bundled image for a descriptor.
    pub fn asset(&self, descriptor: &str, name: &str) -> Result<Arc<RgbaImage>, CatalogError> {
        self.assets.load(name).map_err(|e| match e {
            AssetError::NotFound(asset) => CatalogError::AssetMissing {
                descriptor: descriptor.to_string(),
                asset,
            },
            AssetError::Decode { name, reason } => CatalogError::InvalidAsset {
                descriptor: descriptor.to_string(),
                asset: name,
                reason,
            },
        })
    }

    pub fn secondary_image(&self, descriptor: &str) -> Result<Arc<RgbaImage>, CatalogError> {
        self.asset(descriptor, &self.secondary)
    }

    /// The configured lookup table, checked to be 512x512.
    pub fn lookup_table(&self, descriptor: &str) -> Result<Arc<RgbaImage>, CatalogError> {
        self.table(descriptor, &self.lookup)
    }

    /// Any bundled lookup table by asset name, checked to be 512x512.
    pub fn table(&self, descriptor: &str, name: &str) -> Result<Arc<RgbaImage>, CatalogError> {
        let table = self.asset(descriptor, name)?;
        if table.dimensions() != (LOOKUP_TABLE_SIZE, LOOKUP_TABLE_SIZE) {
            return Err(CatalogError::InvalidAsset {
                descriptor: descriptor.to_string(),
                asset: name.to_string(),
                reason: format!(
                    "expected {size}x{size}, got {}x{}",
                    table.width(),
                    table.height(),
                    size = LOOKUP_TABLE_SIZE
                ),
            });
        }
        Ok(table)
    }
}
