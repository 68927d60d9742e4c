//! # Config — Sizing the Lookup Table
//!
//! The packed table has a fixed size, chosen once when the index is created.
//! Every capacity the builder enforces comes from here:
//!
//! | Field | Default | Bounds |
//! |-------|---------|--------|
//! | `max_lights` | 256 | light entries (128 per row) |
//! | `index_rows` | 222 | flattened index slots (2560 per row) |
//! | `grid_rows` | 32 | tiles (1280 per row) |
//! | `max_lights_per_tile` | 128 | length of one tile's run |
//!
//! The defaults give a 640×256 texture: enough tiles for an 8K target and
//! room for every tile of a 1080p target to list 278 lights.
//!
//! Configs are plain JSON so they can live next to other game settings.
//! Missing fields take their defaults:
//!
//! ```json
//! { "max_lights": 64, "origin": "BottomLeft" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LutError;
use crate::tiled::grid::TileOrigin;
use crate::tiled::layout::{CELLS_PER_ROW, INDICES_PER_ROW, LIGHTS_PER_ROW, LutLayout};

/// Largest integer an f32 holds exactly. Indices, offsets and counts are
/// stored as f32, so no capacity may exceed it.
const MAX_EXACT_F32: usize = 1 << 24;

/// Largest texture height accepted, matching wgpu's default
/// `max_texture_dimension_2d`.
const MAX_TEXTURE_ROWS: u32 = 8192;

/// Light index configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LutConfig {
    /// Maximum number of light entries. Extra lights are dropped.
    pub max_lights: u32,
    /// Texel rows reserved for the flattened light-index list.
    pub index_rows: u32,
    /// Texel rows reserved for the tile (offset, count) table.
    pub grid_rows: u32,
    /// Maximum number of lights listed for a single tile.
    pub max_lights_per_tile: u32,
    /// Fragment-coordinate origin of the consumer.
    pub origin: TileOrigin,
    /// Alternate between two buffers on successive builds.
    pub double_buffered: bool,
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            max_lights: 256,
            index_rows: 222,
            grid_rows: 32,
            max_lights_per_tile: 128,
            origin: TileOrigin::TopLeft,
            double_buffered: true,
        }
    }
}

impl LutConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, LutError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LutError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LutError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| LutError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded light index config from '{}'", path.display());
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, LutError> {
        serde_json::to_string_pretty(self).map_err(|e| LutError::Config(e.to_string()))
    }

    /// Check that every capacity is non-zero, exactly representable and fits
    /// in a texture.
    pub fn validate(&self) -> Result<(), LutError> {
        if self.max_lights == 0 {
            return Err(LutError::Config("max_lights must be at least 1".into()));
        }
        if self.index_rows == 0 || self.grid_rows == 0 {
            return Err(LutError::Config("index_rows and grid_rows must be at least 1".into()));
        }
        if self.max_lights_per_tile == 0 {
            return Err(LutError::Config("max_lights_per_tile must be at least 1".into()));
        }

        let light_rows = self.max_lights.div_ceil(LIGHTS_PER_ROW as u32);
        let height = light_rows as u64 + self.index_rows as u64 + self.grid_rows as u64;
        if height > MAX_TEXTURE_ROWS as u64 {
            return Err(LutError::Config(format!(
                "table needs {height} rows, more than the {MAX_TEXTURE_ROWS} a texture allows"
            )));
        }

        let index_capacity = self.index_rows as usize * INDICES_PER_ROW;
        let cell_capacity = self.grid_rows as usize * CELLS_PER_ROW;
        if index_capacity > MAX_EXACT_F32 || cell_capacity > MAX_EXACT_F32 {
            return Err(LutError::Config(format!(
                "capacities above {MAX_EXACT_F32} cannot be stored exactly as f32"
            )));
        }
        Ok(())
    }

    /// The packed layout this config describes.
    pub fn layout(&self) -> LutLayout {
        LutLayout::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_fill_a_256_row_texture() {
        let config = LutConfig::default();
        config.validate().unwrap();
        let layout = config.layout();
        assert_eq!(layout.height(), 256);
        assert_eq!(layout.index_capacity(), 568_320);
        assert_eq!(layout.cell_capacity(), 40_960);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = LutConfig::from_json_str(r#"{ "max_lights": 64, "origin": "BottomLeft" }"#)
            .unwrap();
        assert_eq!(config.max_lights, 64);
        assert_eq!(config.origin, TileOrigin::BottomLeft);
        assert_eq!(config.grid_rows, LutConfig::default().grid_rows);
    }

    #[test]
    fn json_round_trip() {
        let config = LutConfig {
            max_lights: 32,
            double_buffered: false,
            ..Default::default()
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(LutConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = LutConfig::from_json_str(r#"{ "max_lights": 0 }"#).unwrap_err();
        assert!(matches!(err, LutError::Config(_)));
    }

    #[test]
    fn oversized_table_is_rejected() {
        let config = LutConfig {
            index_rows: 9000,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LutError::Config(_))));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = LutConfig::from_json_str("{ max_lights: }").unwrap_err();
        assert!(matches!(err, LutError::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = LutConfig::from_file("/nonexistent/ljos.json").unwrap_err();
        assert!(matches!(err, LutError::Io(_)));
    }
}
