//! Bundled image assets.
//!
//! A library is either filled in memory or indexed from a directory. Files are
//! decoded the first time they are requested and cached afterwards.

use crate::core::error::AssetError;
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Formats the `image` dependency is built to decode.
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Named image store shared by the catalog and the browser.
#[derive(Debug, Default)]
pub struct AssetLibrary {
    root: Option<PathBuf>,
    index: HashMap<String, PathBuf>,
    cache: Mutex<HashMap<String, Arc<RgbaImage>>>,
}

impl AssetLibrary {
    /// Create an empty in-memory library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every image file below a directory, keyed by file name.
    ///
    /// A missing directory yields an empty library; the entries that need an
    /// asset are then skipped when the catalog is built.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut index = HashMap::new();

        if !dir.is_dir() {
            log::warn!("Asset directory {} does not exist", dir.display());
        } else {
            for entry in walkdir::WalkDir::new(dir)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path();
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();

                if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
                    continue;
                }

                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    // Siblings are visited in name order, so the first path
                    // found for a repeated name is stable across runs.
                    index
                        .entry(name.to_string())
                        .or_insert_with(|| path.to_path_buf());
                }
            }
            log::info!("Indexed {} asset(s) in {}", index.len(), dir.display());
        }

        Self {
            root: Some(dir.to_path_buf()),
            index,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Add (or replace) an in-memory image.
    pub fn insert(&mut self, name: impl Into<String>, image: RgbaImage) {
        let name = name.into();
        self.index.remove(&name);
        self.cache.get_mut().insert(name, Arc::new(image));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_image(mut self, name: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(name, image);
        self
    }

    /// Whether an asset with this name is known. It may still fail to decode.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name) || self.cache.lock().contains_key(name)
    }

    /// Known asset names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        for name in self.cache.lock().keys() {
            if !self.index.contains_key(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    /// Directory the library was indexed from, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Load an image, decoding it on first use.
    pub fn load(&self, name: &str) -> Result<Arc<RgbaImage>, AssetError> {
        if let Some(image) = self.cache.lock().get(name) {
            return Ok(Arc::clone(image));
        }

        let path = self
            .index
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        let decoded = image::open(path).map_err(|e| AssetError::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let image = Arc::new(decoded.to_rgba8());
        log::debug!(
            "Decoded asset '{}' ({}x{})",
            name,
            image.width(),
            image.height()
        );

        self.cache
            .lock()
            .insert(name.to_string(), Arc::clone(&image));
        Ok(image)
    }
}
