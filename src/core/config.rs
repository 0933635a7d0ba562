//! Browser configuration and persisted browsing state.
//!
//! Configuration is read from TOML; every field has a default so an empty file
//! (or no file at all) is a valid configuration.
//!
//! ```toml
//! [assets]
//! dir = "assets"
//! source = "MaYu.jpg"
//! secondary = "Flower.jpg"
//! lookup = "lookup.png"
//!
//! [display]
//! width = 640
//! height = 640
//!
//! [engine]
//! max_frame_pixels = 16777216
//! ```

use crate::core::error::{ChitraResult, ConfigError};
use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Bundled image assets.
    pub assets: AssetConfig,
    /// Display surface settings.
    pub display: DisplayConfig,
    /// Reference engine settings.
    pub engine: EngineConfig,
}

/// Where bundled images live and which ones the catalog uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory scanned for image files.
    pub dir: PathBuf,
    /// Photo every pipeline is fed with.
    pub source: String,
    /// Second photo used by blend and chroma-key entries.
    pub secondary: String,
    /// 512x512 color lookup table.
    pub lookup: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
            source: "MaYu.jpg".to_string(),
            secondary: "Flower.jpg".to_string(),
            lookup: "lookup.png".to_string(),
        }
    }
}

/// Canvas used by generators and overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl DisplayConfig {
    /// Canvas size.
    pub fn canvas(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 640,
        }
    }
}

/// Reference engine limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest frame, in pixels, any unit may produce. `None` is unlimited.
    pub max_frame_pixels: Option<u64>,
}

impl BrowserConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BrowserConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load a configuration file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "display".to_string(),
                reason: format!(
                    "canvas must be non-empty, got {}x{}",
                    self.display.width, self.display.height
                ),
            });
        }
        if self.engine.max_frame_pixels == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "engine.max_frame_pixels".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// The filter the user looked at last, persisted between runs.
///
/// Stored by name rather than by index so a reordered catalog still resolves
/// to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastViewed {
    pub category: String,
    pub name: String,
}

impl LastViewed {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// Read the state file, returning `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> ChitraResult<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Write the state file.
    pub fn save(&self, path: impl AsRef<Path>) -> ChitraResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BrowserConfig::from_toml_str("").unwrap();
        assert_eq!(config, BrowserConfig::default());
        assert_eq!(config.assets.lookup, "lookup.png");
        assert_eq!(config.display.canvas(), Size::new(640, 640));
    }

    #[test]
    fn test_partial_config() {
        let config = BrowserConfig::from_toml_str(
            r#"
            [display]
            width = 320

            [engine]
            max_frame_pixels = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.display.width, 320);
        assert_eq!(config.display.height, 640);
        assert_eq!(config.engine.max_frame_pixels, Some(1000));
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let result = BrowserConfig::from_toml_str("[display]\nwidth = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = BrowserConfig::from_toml_str("[display\nwidth = 1");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chitra.toml");
        std::fs::write(&path, "[assets]\ndir = \"pictures\"\n").unwrap();

        let config = BrowserConfig::load(&path).unwrap();
        assert_eq!(config.assets.dir, PathBuf::from("pictures"));

        let missing = BrowserConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing, BrowserConfig::default());
    }

    #[test]
    fn test_last_viewed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert!(LastViewed::load(&path).unwrap().is_none());

        let state = LastViewed::new("Color adjustments", "Brightness");
        state.save(&path).unwrap();
        assert_eq!(LastViewed::load(&path).unwrap(), Some(state));
    }
}
