//! # Tiled Light Index — Per-Tile Light Lists in One Texture
//!
//! Forward shading with many dynamic lights costs `pixels × lights` if every
//! fragment loops over every light. Most lights only reach a small part of the
//! screen, so the screen is cut into 32×32 pixel tiles and each tile gets the
//! list of lights that can reach it. A fragment then loops over its tile's list
//! only.
//!
//! ## Architecture
//!
//! ```text
//!  &[Light] ──► gather ──► ViewLight[] ─────────────────────────┐
//!  (world)     validate,    (camera space)                       │
//!              cap, view                                         ▼
//!                                         ┌──────────────────────────────┐
//!  Camera ──► TileGrid ──► FrustumCache ─►│ for tile in row-major order: │
//!            (viewport,    (6 planes per  │   for light in entry order:  │
//!             origin)       tile, cached) │     sphere vs frustum?       │
//!                                         │   write run, write cell      │
//!                                         └──────────────┬───────────────┘
//!                                                        ▼
//!                                   PackedBuffer (640 × H RGBA f32 texels)
//!                                                        │
//!                          ┌─────────────────────────────┼──────────────┐
//!                          ▼                             ▼              ▼
//!                      LutReader                  LutTexture::upload  LutParam
//!                    (CPU decode)                   (wgpu, gpu feature)
//! ```
//!
//! ## Capacity
//!
//! The table never grows. When a frame needs more space than the config
//! allows, the builder drops data instead of failing:
//!
//! | Overflow | What is dropped | Counter |
//! |----------|-----------------|---------|
//! | more valid lights than `max_lights` | lights at the end of the input | `lights_dropped` |
//! | a tile reaches `max_lights_per_tile` | the tile's later lights | `tile_overflow` |
//! | the index region fills up | later tiles' lights | `index_overflow` |
//!
//! Every run stays consistent: a cell's `offset + count` never points past the
//! indices actually written. A warning is logged on the first overflowing
//! build after a clean one, not on every frame.
//!
//! ## Usage
//!
//! ```
//! use ljos::prelude::*;
//!
//! let mut index = TiledLightIndex::new(LutConfig::default()).unwrap();
//! let eye = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
//! let camera = Camera::perspective(&eye, 60.0, 0.1, 100.0, Viewport::new(320, 240));
//! let lights = [Light::point(Vec3::ZERO, 2.0)];
//!
//! let lut = index.build(&lights, &camera).unwrap();
//! assert_eq!(lut.param.to_array(), [10.0, 8.0]);
//! assert!(lut.reader().lights_at(160.0, 120.0).count() == 1);
//! ```

pub mod buffer;
pub mod decode;
pub mod encode;
pub mod frustum;
pub mod grid;
pub mod layout;
pub mod stats;

#[cfg(test)]
mod tests;

use std::time::Instant;

use crate::camera::Camera;
use crate::config::LutConfig;
use crate::error::LutError;
use crate::light::{Light, LightKind};

use buffer::BufferRing;
use encode::{ViewLight, write_cell, write_index, write_light};
use frustum::FrustumCache;

pub use buffer::PackedBuffer;
pub use decode::{LightEntry, LutReader, TileCell};
pub use grid::{TILE_SIZE, TileGrid, TileOrigin};
pub use layout::{LutLayout, LutUniform};
pub use stats::{BuildStats, LutCounters};

/// Tile grid dimensions, the second input a consumer needs besides the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LutParam {
    pub grid_width: u32,
    pub grid_height: u32,
}

impl LutParam {
    pub const fn new(grid_width: u32, grid_height: u32) -> Self {
        Self {
            grid_width,
            grid_height,
        }
    }

    /// As a `vec2<f32>` for shaders that take the grid size as floats.
    pub fn to_array(self) -> [f32; 2] {
        [self.grid_width as f32, self.grid_height as f32]
    }
}

/// The result of one build: a read-only view of the table for this frame.
#[derive(Debug, Clone, Copy)]
pub struct LightLut<'a> {
    pub buffer: &'a PackedBuffer,
    pub param: LutParam,
    pub stats: BuildStats,
    pub layout: LutLayout,
    pub grid: TileGrid,
}

impl<'a> LightLut<'a> {
    pub fn reader(&self) -> LutReader<'a> {
        LutReader::new(
            self.buffer,
            self.layout,
            self.param.grid_width,
            self.param.grid_height,
        )
    }

    pub fn uniform(&self) -> LutUniform {
        LutUniform {
            grid_size: [self.param.grid_width, self.param.grid_height],
            index_base_row: self.layout.index_base_row() as u32,
            grid_base_row: self.layout.grid_base_row() as u32,
        }
    }
}

/// Builds the packed light table each frame.
///
/// Create once with a [`LutConfig`], then call [`build`](Self::build) with the
/// frame's lights and camera. All storage is allocated up front; a build only
/// reuses it.
#[derive(Debug)]
pub struct TiledLightIndex {
    config: LutConfig,
    layout: LutLayout,
    ring: BufferRing,
    frusta: FrustumCache,
    entries: Vec<ViewLight>,
    /// Input slice index of each stored entry.
    sources: Vec<usize>,
    tile_counts: Vec<u32>,
    grid: Option<TileGrid>,
    last_stats: BuildStats,
    counters: LutCounters,
    overflowing: bool,
}

impl TiledLightIndex {
    /// Validate `config` and allocate the table.
    pub fn new(config: LutConfig) -> Result<Self, LutError> {
        config.validate()?;
        let layout = config.layout();
        log::debug!(
            "Light index: {}x{} table, {} lights, {} index slots, {} tiles",
            layout.width(),
            layout.height(),
            layout.max_lights(),
            layout.index_capacity(),
            layout.cell_capacity(),
        );
        Ok(Self {
            ring: BufferRing::new(&layout, config.double_buffered),
            frusta: FrustumCache::new(),
            entries: Vec::with_capacity(layout.max_lights()),
            sources: Vec::with_capacity(layout.max_lights()),
            tile_counts: Vec::new(),
            grid: None,
            last_stats: BuildStats::default(),
            counters: LutCounters::default(),
            overflowing: false,
            config,
            layout,
        })
    }

    /// Build the table for `lights` seen through `camera`.
    ///
    /// Fails only on an unusable camera (empty viewport, degenerate
    /// projection, more tiles than the table holds). Lights that don't fit
    /// are dropped and counted in the returned [`BuildStats`].
    pub fn build(&mut self, lights: &[Light], camera: &Camera) -> Result<LightLut<'_>, LutError> {
        let start = Instant::now();
        let layout = self.layout;

        let grid = TileGrid::new(camera.viewport, self.config.origin)?;
        let tiles = grid.tile_count();
        if tiles > layout.cell_capacity() {
            return Err(LutError::GridOverflow {
                tiles,
                capacity: layout.cell_capacity(),
            });
        }
        let frusta = self.frusta.update(camera, &grid)?;

        let mut stats = BuildStats {
            lights_submitted: lights.len(),
            tiles,
            ..Default::default()
        };

        // Gather
        self.entries.clear();
        self.sources.clear();
        for (i, light) in lights.iter().enumerate() {
            if let Err(reason) = light.validate() {
                log::debug!("Skipping light {i}: {reason:?}");
                stats.lights_rejected += 1;
                continue;
            }
            if self.entries.len() == layout.max_lights() {
                stats.lights_dropped += 1;
                continue;
            }
            self.entries.push(ViewLight::new(light, &camera.view));
            self.sources.push(i);
        }
        stats.lights_stored = self.entries.len();

        // Serialize
        let buffer = self.ring.advance();
        buffer.clear();
        for (i, light) in self.entries.iter().enumerate() {
            write_light(buffer, &layout, i, light);
        }

        self.tile_counts.clear();
        self.tile_counts.resize(tiles, 0);
        let per_tile = self.config.max_lights_per_tile as usize;
        let index_capacity = layout.index_capacity();
        let mut cursor = 0;

        for (tile, frustum) in frusta.iter().enumerate() {
            let offset = cursor;
            let mut count = 0;
            for (i, light) in self.entries.iter().enumerate() {
                let hit = match light.kind {
                    LightKind::Directional => true,
                    LightKind::Point | LightKind::Spot => {
                        frustum.intersects_sphere(light.position_camera, light.range)
                    }
                };
                if !hit {
                    continue;
                }
                if count == per_tile {
                    stats.tile_overflow += 1;
                } else if cursor == index_capacity {
                    stats.index_overflow += 1;
                } else {
                    write_index(buffer, &layout, cursor, i as u32);
                    cursor += 1;
                    count += 1;
                }
            }
            write_cell(buffer, &layout, tile, offset as u32, count as u32);
            self.tile_counts[tile] = count as u32;
            stats.max_tile_lights = stats.max_tile_lights.max(count);
        }
        stats.tile_light_pairs = cursor;
        stats.build_us = start.elapsed().as_micros() as u64;

        self.report(&stats);
        self.last_stats = stats;
        self.grid = Some(grid);

        Ok(LightLut {
            buffer: self.ring.current(),
            param: LutParam::new(grid.width, grid.height),
            stats,
            layout,
            grid,
        })
    }

    fn report(&mut self, stats: &BuildStats) {
        self.counters.record(stats);
        let overflowed = stats.overflowed();
        if overflowed && !self.overflowing {
            log::warn!(
                "Light index overflow: {} lights dropped, {} tile and {} index entries skipped \
                 (max_lights {}, max_lights_per_tile {}, index capacity {})",
                stats.lights_dropped,
                stats.tile_overflow,
                stats.index_overflow,
                self.layout.max_lights(),
                self.config.max_lights_per_tile,
                self.layout.index_capacity(),
            );
        } else if !overflowed && self.overflowing {
            log::info!("Light index back within capacity");
        }
        self.overflowing = overflowed;

        log::debug!(
            "Built light index: {} lights, {} tiles, {} pairs (max {} per tile) in {}us [buffer {}]",
            stats.lights_stored,
            stats.tiles,
            stats.tile_light_pairs,
            stats.max_tile_lights,
            stats.build_us,
            self.ring.current_slot(),
        );
    }

    pub fn config(&self) -> &LutConfig {
        &self.config
    }

    pub fn layout(&self) -> &LutLayout {
        &self.layout
    }

    pub fn counters(&self) -> &LutCounters {
        &self.counters
    }

    pub fn last_stats(&self) -> &BuildStats {
        &self.last_stats
    }

    /// The grid of the most recent successful build.
    pub fn grid(&self) -> Option<TileGrid> {
        self.grid
    }

    /// Per-tile light counts of the most recent build, in tile-index order.
    pub fn tile_counts(&self) -> &[u32] {
        &self.tile_counts
    }

    /// Index into the most recent build's input slice of the light stored as
    /// entry `entry`.
    pub fn source_index(&self, entry: usize) -> Option<usize> {
        self.sources.get(entry).copied()
    }
}
